pub mod k3s;
pub mod load_balancer;
pub mod vela;
