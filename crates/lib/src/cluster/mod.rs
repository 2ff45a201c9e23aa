//! Cluster server resolution.
//!
//! A cluster URL points at a balancer rather than a server. The balancer is asked
//! for the server to use, and the send is then posted to that server.

mod balancer;
mod resolver;

pub use balancer::{parse_balancer_response, BalancerClient};
pub use resolver::ClusterResolver;
