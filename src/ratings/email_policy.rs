use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

const TEST_MARKERS: &[&str] = &["test", "example", "fake", "lol", "temp"];

const BLOCKED_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "dispostable.com",
    "emailondeck.com",
    "fakeinbox.com",
    "getnada.com",
    "guerrillamail.com",
    "guerrillamail.net",
    "mailinator.com",
    "maildrop.cc",
    "mailnesia.com",
    "mintemail.com",
    "mohmal.com",
    "sharklasers.com",
    "spamgourmet.com",
    "temp-mail.org",
    "tempmail.com",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
];

const SUSPICIOUS_FRAGMENTS: &[&str] = &[
    "temp",
    "fake",
    "trash",
    "disposable",
    "throwaway",
    "mailinator",
    "guerrilla",
    "tempmail",
    "10minute",
    "sharklasers",
];

const CONSUMER_DOMAINS: &[&str] = &[
    "aol.com",
    "att.net",
    "comcast.net",
    "fastmail.com",
    "gmail.com",
    "gmx.com",
    "gmx.de",
    "googlemail.com",
    "hey.com",
    "hotmail.co.uk",
    "hotmail.com",
    "icloud.com",
    "live.com",
    "mac.com",
    "mail.com",
    "me.com",
    "msn.com",
    "outlook.com",
    "proton.me",
    "protonmail.com",
    "tutanota.com",
    "verizon.net",
    "yahoo.co.uk",
    "yahoo.com",
    "yandex.com",
    "zoho.com",
];

const COMPANY_DOMAINS: &[&str] = &[
    "adobe.com",
    "amazon.com",
    "apple.com",
    "facebook.com",
    "google.com",
    "ibm.com",
    "intel.com",
    "meta.com",
    "microsoft.com",
    "netflix.com",
    "nvidia.com",
    "oracle.com",
    "salesforce.com",
    "youtube.com",
];

const EDUCATIONAL_SUFFIXES: &[&str] = &[".edu", ".ac.uk", ".edu.au"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmailRejection {
    #[error("Invalid email format")]
    Malformed,
    #[error("Test or placeholder email addresses are not allowed")]
    TestDomain,
    #[error("Disposable email addresses are not allowed")]
    BlockedDomain,
    #[error("This email domain looks temporary or disposable")]
    SuspiciousDomain,
    #[error("Please use an email from a recognized provider, company or school")]
    UnrecognizedDomain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPolicy {
    pub test_markers: BTreeSet<String>,
    pub blocked_domains: BTreeSet<String>,
    pub suspicious_fragments: BTreeSet<String>,
    pub consumer_domains: BTreeSet<String>,
    pub company_domains: BTreeSet<String>,
    pub educational_suffixes: Vec<String>,
}

fn owned_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for EmailPolicy {
    fn default() -> Self {
        Self {
            test_markers: owned_set(TEST_MARKERS),
            blocked_domains: owned_set(BLOCKED_DOMAINS),
            suspicious_fragments: owned_set(SUSPICIOUS_FRAGMENTS),
            consumer_domains: owned_set(CONSUMER_DOMAINS),
            company_domains: owned_set(COMPANY_DOMAINS),
            educational_suffixes: EDUCATIONAL_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EmailPolicy {
    // Extra allowed domains join the consumer allow-list; extra blocked
    // domains join the block-list, which is checked first.
    pub fn with_extra_domains(mut self, allowed: &[String], blocked: &[String]) -> Self {
        let normalize = |d: &String| d.trim().to_lowercase();
        self.consumer_domains
            .extend(allowed.iter().map(normalize).filter(|d| !d.is_empty()));
        self.blocked_domains
            .extend(blocked.iter().map(normalize).filter(|d| !d.is_empty()));
        self
    }

    pub fn domain_of(email: &str) -> Option<String> {
        let email = email.trim();
        if !EMAIL_SHAPE.is_match(email) {
            return None;
        }
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
    }

    pub fn classify(&self, email: &str) -> Result<String, EmailRejection> {
        let domain = Self::domain_of(email).ok_or(EmailRejection::Malformed)?;

        let root_label: String = domain
            .split('.')
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_digit())
            .collect();
        if self.test_markers.contains(&root_label) {
            return Err(EmailRejection::TestDomain);
        }

        if self.blocked_domains.contains(&domain) {
            return Err(EmailRejection::BlockedDomain);
        }

        if self
            .suspicious_fragments
            .iter()
            .any(|fragment| domain.contains(fragment.as_str()))
        {
            return Err(EmailRejection::SuspiciousDomain);
        }

        let recognized = self.consumer_domains.contains(&domain)
            || self.company_domains.contains(&domain)
            || self
                .educational_suffixes
                .iter()
                .any(|suffix| domain.ends_with(suffix.as_str()));

        if recognized {
            Ok(domain)
        } else {
            Err(EmailRejection::UnrecognizedDomain)
        }
    }
}
