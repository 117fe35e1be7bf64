use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse kind of resource behind a network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Ec2,
    Elb,
    Rds,
    Lambda,
    Msk,
    OpenSearch,
    Efs,
    NatGateway,
    TransitGateway,
    VpcEndpoint,
    Redshift,
    GlobalAccelerator,
    Unknown,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Ec2 => "EC2",
            ResourceKind::Elb => "ELB",
            ResourceKind::Rds => "RDS",
            ResourceKind::Lambda => "Lambda",
            ResourceKind::Msk => "MSK",
            ResourceKind::OpenSearch => "OpenSearch",
            ResourceKind::Efs => "EFS",
            ResourceKind::NatGateway => "NAT Gateway",
            ResourceKind::TransitGateway => "Transit Gateway",
            ResourceKind::VpcEndpoint => "VPC Endpoint",
            ResourceKind::Redshift => "Redshift",
            ResourceKind::GlobalAccelerator => "Global Accelerator",
            ResourceKind::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Ordered (needles, kind) table. First match wins, so order matters:
/// "lambda" must beat "elb" and "elb" must beat the EC2 fallback.
const DESCRIPTION_RULES: &[(&[&str], ResourceKind)] = &[
    (&["lambda"], ResourceKind::Lambda),
    (&["elb"], ResourceKind::Elb),
    (&["rds"], ResourceKind::Rds),
    (&["msk", "kafka"], ResourceKind::Msk),
    (&["opensearch", "es endpoint"], ResourceKind::OpenSearch),
    (&["efs", "mount target"], ResourceKind::Efs),
    (&["nat gateway"], ResourceKind::NatGateway),
    (&["transit gateway", "tgw"], ResourceKind::TransitGateway),
    (&["vpce", "vpc endpoint"], ResourceKind::VpcEndpoint),
    (&["redshift"], ResourceKind::Redshift),
    (&["global accelerator"], ResourceKind::GlobalAccelerator),
];

/// Interface type AWS reports for plain instance ENIs.
const DEFAULT_INTERFACE_TYPE: &str = "interface";

/// Infer what owns an interface from its free-text description.
pub fn classify(description: &str, interface_type: &str) -> ResourceKind {
    let desc = description.to_lowercase();

    for (needles, kind) in DESCRIPTION_RULES {
        if needles.iter().any(|n| desc.contains(n)) {
            return *kind;
        }
    }

    if interface_type == DEFAULT_INTERFACE_TYPE {
        ResourceKind::Ec2
    } else {
        ResourceKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_service_descriptions() {
        let cases = [
            ("AWS Lambda VPC ENI-my-fn", ResourceKind::Lambda),
            ("ELB app/my-alb/50dc6c495c0c9188", ResourceKind::Elb),
            ("RDSNetworkInterface", ResourceKind::Rds),
            ("Kafka broker eni", ResourceKind::Msk),
            ("ES endpoint for domain logs", ResourceKind::OpenSearch),
            ("EFS mount target for fs-1234", ResourceKind::Efs),
            ("Interface for NAT Gateway nat-0abc", ResourceKind::NatGateway),
            ("Network Interface for Transit Gateway Attachment", ResourceKind::TransitGateway),
            ("VPC Endpoint Interface vpce-0123", ResourceKind::VpcEndpoint),
            ("Redshift cluster node", ResourceKind::Redshift),
            ("Global Accelerator ENI", ResourceKind::GlobalAccelerator),
        ];
        for (desc, expected) in cases {
            assert_eq!(classify(desc, "interface"), expected, "{}", desc);
        }
    }

    #[test]
    fn first_match_wins() {
        // mentions both lambda and elb
        assert_eq!(classify("lambda behind elb", "interface"), ResourceKind::Lambda);
        // an ELB ENI still reports interface type "interface"
        assert_eq!(classify("ELB net/nlb/abc", "interface"), ResourceKind::Elb);
    }

    #[test]
    fn fallback_on_interface_type() {
        assert_eq!(classify("", "interface"), ResourceKind::Ec2);
        assert_eq!(classify("Primary network interface", "interface"), ResourceKind::Ec2);
        assert_eq!(classify("", "trunk"), ResourceKind::Unknown);
        assert_eq!(classify("-", "-"), ResourceKind::Unknown);
    }

    #[test]
    fn display_names() {
        assert_eq!(ResourceKind::NatGateway.to_string(), "NAT Gateway");
        assert_eq!(ResourceKind::Ec2.to_string(), "EC2");
    }
}
