use crate::types::{Rule, RobotsGroup};

struct ParsedGroup {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<f64>,
}

/// Parses a robots.txt body into per-user-agent groups, then picks the one
/// that applies to `user_agent` — an exact (case-insensitive) token match
/// if one exists, falling back to the wildcard `*` group. Returns `None`
/// when no group applies, which callers treat as "unrestricted".
///
/// This is deliberately not a full RFC 9309 implementation (no `%XX`
/// unescaping, no `$` end-of-path anchors) — just the core directives:
/// `User-agent`, `Allow`, `Disallow`, `Crawl-delay`.
pub(crate) fn find_group(body: &str, user_agent: &str) -> Option<RobotsGroup> {
    let groups = parse_groups(body);
    let ua = user_agent.trim().to_lowercase();

    let matched = groups
        .iter()
        .find(|g| g.agents.iter().any(|a| !a.is_empty() && ua.contains(a.as_str())))
        .or_else(|| groups.iter().find(|g| g.agents.iter().any(|a| a == "*")))?;

    Some(RobotsGroup { rules: matched.rules.clone(), crawl_delay: matched.crawl_delay })
}

fn parse_groups(body: &str) -> Vec<ParsedGroup> {
    let mut groups = Vec::new();
    let mut agents: Vec<String> = Vec::new();
    let mut rules: Vec<Rule> = Vec::new();
    let mut crawl_delay: Option<f64> = None;
    let mut seen_directive_since_agents = false;

    for raw_line in body.lines() {
        let line = match raw_line.split('#').next() {
            Some(l) => l.trim(),
            None => continue,
        };
        if line.is_empty() {
            continue;
        }
        let Some((directive, value)) = line.split_once(':') else { continue };
        let directive = directive.trim().to_lowercase();
        let value = value.trim();

        match directive.as_str() {
            "user-agent" => {
                if seen_directive_since_agents && !agents.is_empty() {
                    groups.push(ParsedGroup { agents: std::mem::take(&mut agents), rules: std::mem::take(&mut rules), crawl_delay: crawl_delay.take() });
                    seen_directive_since_agents = false;
                }
                agents.push(value.to_lowercase());
            }
            "disallow" => {
                if !value.is_empty() {
                    rules.push(Rule { path: value.to_string(), allow: false });
                }
                seen_directive_since_agents = true;
            }
            "allow" => {
                if !value.is_empty() {
                    rules.push(Rule { path: value.to_string(), allow: true });
                }
                seen_directive_since_agents = true;
            }
            "crawl-delay" => {
                crawl_delay = value.parse().ok();
                seen_directive_since_agents = true;
            }
            _ => {}
        }
    }

    if !agents.is_empty() {
        groups.push(ParsedGroup { agents, rules, crawl_delay });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "
User-agent: Googlebot
Disallow: /private
Allow: /private/readme

User-agent: *
Crawl-delay: 2
Disallow: /
";

    #[test]
    fn picks_the_named_agent_over_wildcard() {
        let g = find_group(BODY, "Googlebot/2.1").unwrap();
        assert!(g.allowed("/private/readme"));
        assert!(!g.allowed("/private/secret"));
        assert!(g.allowed("/anything-else"));
    }

    #[test]
    fn falls_back_to_wildcard_group() {
        let g = find_group(BODY, "frontierbot").unwrap();
        assert!(!g.allowed("/anything"));
        assert_eq!(g.crawl_delay, Some(2.0));
    }

    #[test]
    fn no_matching_group_is_none() {
        const NO_WILDCARD: &str = "User-agent: Bingbot\nDisallow: /\n";
        assert!(find_group(NO_WILDCARD, "frontierbot").is_none());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        const COMMENTED: &str = "# full disallow\nUser-agent: *\n# block everything\nDisallow: /\n";
        let g = find_group(COMMENTED, "frontierbot").unwrap();
        assert!(!g.allowed("/x"));
    }
}
