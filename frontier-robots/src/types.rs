use frontier_time::{Duration, Instant};

/// A single `Allow`/`Disallow` rule within a matched user-agent group.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub(crate) path: String,
    pub(crate) allow: bool,
}

/// The rules that apply to this resolver's configured user agent, parsed
/// out of one origin's robots.txt. Longest matching `path` prefix wins;
/// ties favor `Allow` over `Disallow` (the de facto convention most
/// crawlers follow).
#[derive(Debug, Clone, Default)]
pub struct RobotsGroup {
    pub(crate) rules: Vec<Rule>,
    pub(crate) crawl_delay: Option<f64>,
}

impl RobotsGroup {
    pub(crate) fn allowed(&self, path: &str) -> bool {
        let mut best: Option<&Rule> = None;
        for rule in &self.rules {
            if !path.starts_with(rule.path.as_str()) {
                continue;
            }
            best = match best {
                None => Some(rule),
                Some(b) if rule.path.len() > b.path.len() => Some(rule),
                Some(b) if rule.path.len() == b.path.len() && rule.allow && !b.allow => Some(rule),
                Some(b) => Some(b),
            };
        }
        best.map(|r| r.allow).unwrap_or(true)
    }
}

/// The outcome of a robots.txt fetch, as it bears on crawl decisions:
/// either rules for the configured user agent, or one of the two
/// status-code-driven defaults (4xx -> unrestricted, 5xx -> disallow all).
#[derive(Debug, Clone)]
pub(crate) enum Policy {
    Unrestricted,
    DisallowAll,
    Rules(RobotsGroup),
}

/// A cached robots.txt resolution for one origin.
///
/// `policy` being `Unrestricted` means "no restrictions for this origin"
/// (either the robots.txt had no group matching this resolver's user
/// agent, or the fetch returned 4xx). `test` and `crawl_delay` both treat
/// that case as fully permissive.
#[derive(Debug, Clone)]
pub struct RobotsEntry {
    pub(crate) policy: Policy,
    pub last_fetched: Instant,
}

impl RobotsEntry {
    pub(crate) fn new(policy: Policy, last_fetched: Instant) -> Self {
        Self { policy, last_fetched }
    }

    /// Whether `path` may be crawled under this entry's rules.
    pub fn test(&self, path: &str) -> bool {
        match &self.policy {
            Policy::Unrestricted => true,
            Policy::DisallowAll => false,
            Policy::Rules(group) => group.allowed(path),
        }
    }

    /// The `Crawl-delay` directive for this resolver's user agent, if any.
    pub fn crawl_delay(&self) -> Duration {
        match &self.policy {
            Policy::Rules(group) => match group.crawl_delay {
                Some(secs) if secs.is_finite() && secs >= 0.0 => {
                    Duration::seconds_f64(secs)
                }
                _ => Duration::ZERO,
            },
            Policy::Unrestricted | Policy::DisallowAll => Duration::ZERO,
        }
    }
}
