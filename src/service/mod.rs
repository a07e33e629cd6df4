//! Service clients
//!
//! One façade per cloud service. Each method takes the operation context
//! first and returns `Result<T>`; on failure the HTTP status rides on the
//! error (`Error::status`, zero when no exchange happened). Optional list
//! parameters left as `None` are omitted from the query, never sent empty.
//!
//! # Module Structure
//!
//! - [`project`] - Project summary and service zones
//! - [`product`] - Product groups and products
//! - [`vpc`] - VPCs and VPC direct connects
//! - [`subnet`] - Subnets
//! - [`public_ip`] - Public IP reservations
//! - [`internet_gateway`] - Internet gateways
//! - [`nat_gateway`] - NAT gateways
//! - [`firewall`] - Firewalls and firewall rules
//! - [`block_storage`] - Block storage volumes
//! - [`file_storage`] - File storage volumes
//! - [`kubernetes`] - Kubernetes engines and node pools
//! - [`load_balancer`] - Load balancer profiles
//! - [`iam`] - IAM roles
//! - [`tag`] - Resource tags

pub mod block_storage;
pub mod file_storage;
pub mod firewall;
pub mod iam;
pub mod internet_gateway;
pub mod kubernetes;
pub mod load_balancer;
pub mod nat_gateway;
pub mod product;
pub mod project;
pub mod public_ip;
pub mod subnet;
pub mod tag;
pub mod vpc;

use crate::scp::ScpClient;

impl ScpClient {
    pub fn project(&self) -> project::ProjectService<'_> {
        project::ProjectService::new(self)
    }

    pub fn product(&self) -> product::ProductService<'_> {
        product::ProductService::new(self)
    }

    pub fn vpc(&self) -> vpc::VpcService<'_> {
        vpc::VpcService::new(self)
    }

    pub fn subnet(&self) -> subnet::SubnetService<'_> {
        subnet::SubnetService::new(self)
    }

    pub fn public_ip(&self) -> public_ip::PublicIpService<'_> {
        public_ip::PublicIpService::new(self)
    }

    pub fn internet_gateway(&self) -> internet_gateway::InternetGatewayService<'_> {
        internet_gateway::InternetGatewayService::new(self)
    }

    pub fn nat_gateway(&self) -> nat_gateway::NatGatewayService<'_> {
        nat_gateway::NatGatewayService::new(self)
    }

    pub fn firewall(&self) -> firewall::FirewallService<'_> {
        firewall::FirewallService::new(self)
    }

    pub fn block_storage(&self) -> block_storage::BlockStorageService<'_> {
        block_storage::BlockStorageService::new(self)
    }

    pub fn file_storage(&self) -> file_storage::FileStorageService<'_> {
        file_storage::FileStorageService::new(self)
    }

    pub fn kubernetes(&self) -> kubernetes::KubernetesService<'_> {
        kubernetes::KubernetesService::new(self)
    }

    pub fn load_balancer(&self) -> load_balancer::LoadBalancerService<'_> {
        load_balancer::LoadBalancerService::new(self)
    }

    pub fn iam(&self) -> iam::IamService<'_> {
        iam::IamService::new(self)
    }

    pub fn tag(&self) -> tag::TagService<'_> {
        tag::TagService::new(self)
    }
}
