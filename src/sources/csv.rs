//! Parsers for Semrush's semicolon-delimited responses
//!
//! All parsers are pure functions of the raw text so stored payloads can be
//! re-parsed later. Row 0 is the header; columns are read by position in the
//! order requested through `export_columns`. Empty bodies, `ERROR ...` bodies
//! and bodies without a data row parse to `None` (or an empty list).

use serde::{Deserialize, Serialize};

/// `domain_ranks` row: `Db;Dn;Rk;Or;Ot;Oc;Ad;At;Ac`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainOverview {
    pub database: String,
    pub domain: String,
    pub rank: Option<u64>,
    pub organic_keywords: Option<u64>,
    pub organic_traffic: Option<u64>,
    pub organic_cost: Option<f64>,
    pub adwords_keywords: Option<u64>,
    pub adwords_traffic: Option<u64>,
    pub adwords_cost: Option<f64>,
}

/// `backlinks_overview` row:
/// `ascore;total;domains_num;urls_num;ips_num;follows_num;nofollows_num`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklinksOverview {
    pub authority_score: Option<u64>,
    pub total_backlinks: Option<u64>,
    pub referring_domains: Option<u64>,
    pub referring_urls: Option<u64>,
    pub referring_ips: Option<u64>,
    pub follow_links: Option<u64>,
    pub nofollow_links: Option<u64>,
}

/// `domain_organic` row: `Ph;Po;Nq;Cp;Ur;Tr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganicKeyword {
    pub phrase: String,
    pub position: Option<u64>,
    pub search_volume: Option<u64>,
    pub cpc: Option<f64>,
    pub url: String,
    pub traffic_percent: Option<f64>,
}

/// `backlinks_refdomains` row: `domain_ascore;domain;backlinks_num`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferringDomain {
    pub authority_score: Option<u64>,
    pub domain: String,
    pub backlinks: Option<u64>,
}

/// Split a payload into data rows of trimmed fields
pub fn data_rows(text: &str) -> Option<Vec<Vec<&str>>> {
    let text = text.trim();
    if text.is_empty() || text.starts_with("ERROR") {
        return None;
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    Some(
        lines[1..]
            .iter()
            .map(|line| line.split(';').map(str::trim).collect())
            .collect(),
    )
}

fn count(fields: &[&str], idx: usize) -> Option<u64> {
    let raw = fields.get(idx)?.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u64)
}

fn decimal(fields: &[&str], idx: usize) -> Option<f64> {
    fields
        .get(idx)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn text(fields: &[&str], idx: usize) -> String {
    fields.get(idx).map(|s| s.to_string()).unwrap_or_default()
}

pub fn parse_domain_overview(body: &str) -> Option<DomainOverview> {
    let rows = data_rows(body)?;
    let fields = rows.first()?;

    Some(DomainOverview {
        database: text(fields, 0),
        domain: text(fields, 1),
        rank: count(fields, 2),
        organic_keywords: count(fields, 3),
        organic_traffic: count(fields, 4),
        organic_cost: decimal(fields, 5),
        adwords_keywords: count(fields, 6),
        adwords_traffic: count(fields, 7),
        adwords_cost: decimal(fields, 8),
    })
}

pub fn parse_backlinks_overview(body: &str) -> Option<BacklinksOverview> {
    let rows = data_rows(body)?;
    let fields = rows.first()?;

    Some(BacklinksOverview {
        authority_score: count(fields, 0),
        total_backlinks: count(fields, 1),
        referring_domains: count(fields, 2),
        referring_urls: count(fields, 3),
        referring_ips: count(fields, 4),
        follow_links: count(fields, 5),
        nofollow_links: count(fields, 6),
    })
}

pub fn parse_organic_keywords(body: &str) -> Vec<OrganicKeyword> {
    data_rows(body)
        .unwrap_or_default()
        .iter()
        .filter(|fields| !fields.first().map_or(true, |p| p.is_empty()))
        .map(|fields| OrganicKeyword {
            phrase: text(fields, 0),
            position: count(fields, 1),
            search_volume: count(fields, 2),
            cpc: decimal(fields, 3),
            url: text(fields, 4),
            traffic_percent: decimal(fields, 5),
        })
        .collect()
}

pub fn parse_referring_domains(body: &str) -> Vec<ReferringDomain> {
    data_rows(body)
        .unwrap_or_default()
        .iter()
        .filter(|fields| fields.len() >= 2 && !fields[1].is_empty())
        .map(|fields| ReferringDomain {
            authority_score: count(fields, 0),
            domain: text(fields, 1),
            backlinks: count(fields, 2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERVIEW: &str =
        "Db;Dn;Rk;Or;Ot;Oc;Ad;At;Ac\nus;example.com;500;120;4300;10.5;5;60;2.1";

    #[test]
    fn test_parse_domain_overview() {
        let overview = parse_domain_overview(OVERVIEW).unwrap();
        assert_eq!(overview.rank, Some(500));
        assert_eq!(overview.organic_keywords, Some(120));
        assert_eq!(overview.organic_traffic, Some(4300));
        assert_eq!(overview.domain, "example.com");
        assert_eq!(overview.organic_cost, Some(10.5));
        assert_eq!(overview.adwords_cost, Some(2.1));
    }

    #[test]
    fn test_parse_is_repeatable() {
        assert_eq!(parse_domain_overview(OVERVIEW), parse_domain_overview(OVERVIEW));
    }

    #[test]
    fn test_degenerate_payloads() {
        assert!(parse_domain_overview("").is_none());
        assert!(parse_domain_overview("ERROR 50 :: NOTHING FOUND").is_none());
        assert!(parse_domain_overview("Db;Dn;Rk").is_none());
        assert!(parse_backlinks_overview("   \n  ").is_none());
        assert!(parse_organic_keywords("ERROR 132 :: API UNITS BALANCE IS ZERO").is_empty());
        assert!(parse_referring_domains("domain_ascore;domain;backlinks_num").is_empty());
    }

    #[test]
    fn test_short_row_leaves_fields_empty() {
        let overview = parse_domain_overview("Db;Dn;Rk;Or\nus;example.com;n/a").unwrap();
        assert_eq!(overview.rank, None);
        assert_eq!(overview.organic_keywords, None);
    }

    #[test]
    fn test_parse_backlinks_overview() {
        let body = "ascore;total;domains_num;urls_num;ips_num;follows_num;nofollows_num\r\n42;15000;320;900;210;11000;4000\r\n";
        let overview = parse_backlinks_overview(body).unwrap();
        assert_eq!(overview.authority_score, Some(42));
        assert_eq!(overview.total_backlinks, Some(15000));
        assert_eq!(overview.nofollow_links, Some(4000));
    }

    #[test]
    fn test_parse_keyword_and_domain_lists() {
        let keywords = parse_organic_keywords(
            "Keyword;Position;Search Volume;CPC;Url;Traffic (%)\n\
             cabin rental;3;2400;1.20;https://example.com/cabins;35.5\n\
             lake cabin;7;880;0.90;https://example.com/lake;8.1",
        );
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].phrase, "cabin rental");
        assert_eq!(keywords[1].position, Some(7));

        let domains = parse_referring_domains(
            "domain_ascore;domain;backlinks_num\n55;news.example.org;12\n;;\n",
        );
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].backlinks, Some(12));
    }
}
