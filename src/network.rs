//! CIDR parsing and network disjointness checks
//!
//! A Seed can only host a Shoot whose node/pod/service networks do not
//! overlap any of the Seed's own networks. CIDRs are parsed into inclusive
//! numeric address ranges; ranges of different address families never
//! overlap.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A parsed CIDR block as an inclusive numeric address range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrBlock {
    start: u128,
    end: u128,
    ipv4: bool,
    text: String,
}

impl CidrBlock {
    /// Returns true when the two blocks share at least one address.
    /// Blocks of different address families are always disjoint.
    pub fn overlaps(&self, other: &CidrBlock) -> bool {
        self.ipv4 == other.ipv4 && self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Parses a CIDR string of either address family. Host bits below the
/// prefix are masked off, mirroring what the API server accepts.
pub fn parse_cidr(cidr: &str) -> Result<CidrBlock, String> {
    let (addr, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| format!("invalid CIDR format: '{}'", cidr))?;

    let prefix_len: u32 = prefix
        .parse()
        .map_err(|_| format!("invalid prefix length: '{}'", prefix))?;

    if let Ok(v4) = addr.parse::<Ipv4Addr>() {
        if prefix_len > 32 {
            return Err(format!(
                "prefix length {} is out of range for IPv4 CIDR '{}'",
                prefix_len, cidr
            ));
        }
        let value = u32::from(v4) as u128;
        let host_bits = 32 - prefix_len;
        let mask = if host_bits == 32 {
            0u128
        } else {
            !((1u128 << host_bits) - 1) & (u32::MAX as u128)
        };
        let start = value & mask;
        let end = start | ((1u128 << host_bits) - 1);
        return Ok(CidrBlock {
            start,
            end,
            ipv4: true,
            text: cidr.to_string(),
        });
    }

    if let Ok(v6) = addr.parse::<Ipv6Addr>() {
        if prefix_len > 128 {
            return Err(format!(
                "prefix length {} is out of range for IPv6 CIDR '{}'",
                prefix_len, cidr
            ));
        }
        let value = u128::from(v6);
        let host_bits = 128 - prefix_len;
        let (start, end) = if host_bits == 128 {
            (0, u128::MAX)
        } else {
            let start = value & !((1u128 << host_bits) - 1);
            (start, start | ((1u128 << host_bits) - 1))
        };
        return Ok(CidrBlock {
            start,
            end,
            ipv4: false,
            text: cidr.to_string(),
        });
    }

    Err(format!("invalid network address: '{}'", addr))
}

/// Checks that every parseable network in the list is disjoint from every
/// other. Returns one finding per parse failure and per overlapping pair;
/// an empty result means the networks are disjoint.
pub fn disjointness_findings(networks: &[(&str, Option<&str>)]) -> Vec<String> {
    let mut findings = Vec::new();
    let mut parsed: Vec<(&str, CidrBlock)> = Vec::new();

    for &(label, cidr) in networks {
        let Some(cidr) = cidr else { continue };
        match parse_cidr(cidr) {
            Ok(block) => parsed.push((label, block)),
            Err(reason) => findings.push(format!("{} network: {}", label, reason)),
        }
    }

    for (i, (label_a, block_a)) in parsed.iter().enumerate() {
        for (label_b, block_b) in parsed.iter().skip(i + 1) {
            if block_a.overlaps(block_b) {
                findings.push(format!(
                    "{} network ('{}') intersects {} network ('{}')",
                    label_a, block_a, label_b, block_b
                ));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr_v4() {
        let block = parse_cidr("10.88.0.0/16").unwrap();
        assert!(block.ipv4);
        assert_eq!(block.start, u32::from(std::net::Ipv4Addr::new(10, 88, 0, 0)) as u128);
        assert_eq!(
            block.end,
            u32::from(std::net::Ipv4Addr::new(10, 88, 255, 255)) as u128
        );
    }

    #[test]
    fn test_parse_cidr_masks_host_bits() {
        let a = parse_cidr("192.168.1.77/24").unwrap();
        let b = parse_cidr("192.168.1.0/24").unwrap();
        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
    }

    #[test]
    fn test_parse_cidr_v6() {
        let block = parse_cidr("2001:db8::/32").unwrap();
        assert!(!block.ipv4);
        assert!(block.overlaps(&parse_cidr("2001:db8:1::/48").unwrap()));
    }

    #[test]
    fn test_parse_cidr_invalid() {
        assert!(parse_cidr("10.0.0.0").is_err());
        assert!(parse_cidr("10.0.0.0/33").is_err());
        assert!(parse_cidr("not-an-address/8").is_err());
        assert!(parse_cidr("10.0.0.0/x").is_err());
    }

    #[test]
    fn test_overlap_nested() {
        let outer = parse_cidr("10.0.0.0/8").unwrap();
        let inner = parse_cidr("10.250.0.0/16").unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_overlap_disjoint() {
        let a = parse_cidr("10.0.0.0/16").unwrap();
        let b = parse_cidr("10.1.0.0/16").unwrap();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_overlap_cross_family_is_disjoint() {
        let v4 = parse_cidr("10.0.0.0/8").unwrap();
        let v6 = parse_cidr("::/0").unwrap();
        assert!(!v4.overlaps(&v6));
    }

    #[test]
    fn test_findings_empty_for_disjoint_networks() {
        let findings = disjointness_findings(&[
            ("shoot nodes", Some("10.250.0.0/16")),
            ("shoot pods", Some("100.96.0.0/11")),
            ("seed services", Some("10.2.0.0/16")),
            ("absent", None),
        ]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_findings_report_overlap_pair() {
        let findings = disjointness_findings(&[
            ("shoot nodes", Some("10.0.0.0/16")),
            ("seed pods", Some("10.0.1.0/24")),
        ]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("shoot nodes"));
        assert!(findings[0].contains("seed pods"));
    }

    #[test]
    fn test_findings_report_parse_failure() {
        let findings = disjointness_findings(&[("seed pods", Some("garbage"))]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("seed pods"));
        assert!(findings[0].contains("invalid CIDR format"));
    }
}
