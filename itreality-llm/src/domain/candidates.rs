//! Deterministic finding candidates
//!
//! Every finding a report may rank is derived here from the signal bundle.
//! The model only words them; it cannot invent codes, change severity or
//! raise confidence.

use std::cmp::Ordering;

use itreality_core::domain::{
    CandidateFinding, CheckOutcome, Confidence, DmarcPolicy, FindingSeverity,
    HostingClassification, SignalBlock, SignalBundle, SignalCategory,
};

pub mod codes {
    pub const DMARC_MISSING: &str = "DMARC_MISSING";
    pub const DMARC_NOT_ENFORCING: &str = "DMARC_NOT_ENFORCING";
    pub const SPF_MISSING: &str = "SPF_MISSING";
    pub const SPF_PERMISSIVE: &str = "SPF_PERMISSIVE";
    pub const DKIM_NOT_FOUND: &str = "DKIM_NOT_FOUND";
    pub const EMAIL_AUTH_UNVERIFIED: &str = "EMAIL_AUTH_UNVERIFIED";
    pub const CERT_EXPIRED: &str = "CERT_EXPIRED";
    pub const CERT_EXPIRING_SOON: &str = "CERT_EXPIRING_SOON";
    pub const CERT_UNTRUSTED: &str = "CERT_UNTRUSTED";
    pub const TLS_UNAVAILABLE: &str = "TLS_UNAVAILABLE";
    pub const KNOWN_BREACHES: &str = "KNOWN_BREACHES";
    pub const YOUNG_DOMAIN: &str = "YOUNG_DOMAIN";
    pub const NO_MX_RECORDS: &str = "NO_MX_RECORDS";
    pub const SELF_HOSTED_INFRASTRUCTURE: &str = "SELF_HOSTED_INFRASTRUCTURE";
    pub const LARGE_SUBDOMAIN_SURFACE: &str = "LARGE_SUBDOMAIN_SURFACE";
    pub const PLATFORM_DISCLOSED: &str = "PLATFORM_DISCLOSED";
}

/// Certificates closer than this to expiry are flagged
pub const CERT_EXPIRY_WARNING_DAYS: i64 = 30;
/// Below this many days the expiry finding is raised to high severity
pub const CERT_EXPIRY_URGENT_DAYS: i64 = 7;
pub const YOUNG_DOMAIN_DAYS: i64 = 180;
pub const LARGE_SUBDOMAIN_SURFACE: usize = 50;

fn candidate(
    code: &str,
    block: &SignalBlock,
    severity: FindingSeverity,
    title: impl Into<String>,
    description: impl Into<String>,
) -> CandidateFinding {
    CandidateFinding {
        finding_code: code.to_string(),
        category: block.category(),
        severity,
        confidence: block.confidence,
        title: title.into(),
        description: description.into(),
    }
}

/// Candidate findings for a bundle, in ranking order
pub fn derive_candidates(bundle: &SignalBundle) -> Vec<CandidateFinding> {
    let domain = bundle.domain();
    let mut found = Vec::new();

    let email = bundle.block(SignalCategory::Email);
    if email.is_failed() {
        found.push(candidate(
            codes::EMAIL_AUTH_UNVERIFIED,
            email,
            FindingSeverity::Medium,
            "Email protection could not be checked",
            format!(
                "We could not look up the SPF, DKIM or DMARC records for {domain}, so we cannot say \
                 whether others can send email pretending to be you."
            ),
        ));
    } else if let Some(signals) = bundle.email() {
        match signals.dmarc.status {
            CheckOutcome::Absent => found.push(candidate(
                codes::DMARC_MISSING,
                email,
                FindingSeverity::High,
                "No DMARC policy",
                format!(
                    "{domain} publishes no DMARC record, so receiving mail servers are not told to \
                     reject messages that fake your address."
                ),
            )),
            CheckOutcome::Present
                if !signals.dmarc.policy.is_some_and(|p| p.is_enforcing()) =>
            {
                let policy = signals
                    .dmarc
                    .policy
                    .map(|p| match p {
                        DmarcPolicy::None => "p=none",
                        DmarcPolicy::Quarantine => "p=quarantine",
                        DmarcPolicy::Reject => "p=reject",
                    })
                    .unwrap_or("no valid policy");
                found.push(candidate(
                    codes::DMARC_NOT_ENFORCING,
                    email,
                    FindingSeverity::Medium,
                    "DMARC only monitors",
                    format!(
                        "The DMARC record for {domain} has {policy}, which reports spoofed mail \
                         but does not stop it being delivered."
                    ),
                ));
            }
            _ => {}
        }

        match signals.spf.status {
            CheckOutcome::Absent => found.push(candidate(
                codes::SPF_MISSING,
                email,
                FindingSeverity::High,
                "No SPF record",
                format!("{domain} does not list which servers are allowed to send its email."),
            )),
            CheckOutcome::Present
                if matches!(signals.spf.all_qualifier.as_deref(), Some("+") | Some("?")) =>
            {
                found.push(candidate(
                    codes::SPF_PERMISSIVE,
                    email,
                    FindingSeverity::Medium,
                    "SPF allows any sender",
                    format!(
                        "The SPF record for {domain} ends in a permissive `all` rule, so it does \
                         not actually restrict who may send as you."
                    ),
                ));
            }
            _ => {}
        }

        if signals.dkim.status == CheckOutcome::Absent {
            found.push(candidate(
                codes::DKIM_NOT_FOUND,
                email,
                FindingSeverity::Low,
                "No DKIM key found",
                format!(
                    "None of the {} common DKIM selectors we checked returned a signing key. Your \
                     provider may use a selector we did not try.",
                    signals.dkim.selectors_checked.len()
                ),
            ));
        }
    }

    let tls = bundle.block(SignalCategory::Tls);
    if tls.is_failed() {
        found.push(candidate(
            codes::TLS_UNAVAILABLE,
            tls,
            FindingSeverity::High,
            "Website certificate could not be inspected",
            format!("We could not complete a secure (HTTPS) connection to {domain}."),
        ));
    } else if let Some(signals) = bundle.tls() {
        match signals.days_until_expiry {
            Some(days) if days < 0 => found.push(candidate(
                codes::CERT_EXPIRED,
                tls,
                FindingSeverity::Critical,
                "Website certificate has expired",
                format!(
                    "The certificate for {domain} expired {} days ago. Visitors see a security \
                     warning.",
                    -days
                ),
            )),
            Some(days) if days <= CERT_EXPIRY_WARNING_DAYS => {
                let severity = if days <= CERT_EXPIRY_URGENT_DAYS {
                    FindingSeverity::High
                } else {
                    FindingSeverity::Medium
                };
                found.push(candidate(
                    codes::CERT_EXPIRING_SOON,
                    tls,
                    severity,
                    "Website certificate expires soon",
                    format!(
                        "The certificate for {domain} expires in {days} days. If it is not \
                         renewed, visitors will see a security warning."
                    ),
                ));
            }
            _ => {
                if !signals.trusted {
                    found.push(candidate(
                        codes::CERT_UNTRUSTED,
                        tls,
                        FindingSeverity::High,
                        "Website certificate is not trusted",
                        format!(
                            "Browsers do not accept the certificate presented by {domain}: {}.",
                            signals
                                .verification_error
                                .as_deref()
                                .unwrap_or("verification failed")
                        ),
                    ));
                }
            }
        }
    }

    let hibp = bundle.block(SignalCategory::Hibp);
    if let Some(signals) = bundle.hibp()
        && !hibp.is_failed()
        && signals.breach_count > 0
    {
        let latest = signals
            .most_recent_breach
            .map(|d| format!(" The most recent was on {d}."))
            .unwrap_or_default();
        found.push(candidate(
            codes::KNOWN_BREACHES,
            hibp,
            FindingSeverity::High,
            "Addresses appear in known breaches",
            format!(
                "Email addresses at {domain} appear in {} public data breach{}.{latest}",
                signals.breach_count,
                if signals.breach_count == 1 { "" } else { "es" }
            ),
        ));
    }

    let dns = bundle.block(SignalCategory::Dns);
    if let Some(signals) = bundle.dns()
        && !dns.is_failed()
    {
        if let Some(age) = signals.domain_age_days
            && age < YOUNG_DOMAIN_DAYS
        {
            found.push(candidate(
                codes::YOUNG_DOMAIN,
                dns,
                FindingSeverity::Low,
                "Recently registered domain",
                format!(
                    "{domain} was registered {age} days ago. Some mail filters treat new domains \
                     with suspicion."
                ),
            ));
        }
        if signals.resolvable && signals.mx_records.is_empty() {
            found.push(candidate(
                codes::NO_MX_RECORDS,
                dns,
                FindingSeverity::Medium,
                "No mail servers published",
                format!("{domain} publishes no MX records, so it cannot receive email."),
            ));
        }
    }

    let exposure = bundle.block(SignalCategory::Exposure);
    if let Some(signals) = bundle.exposure()
        && !exposure.is_failed()
        && signals.hosting == HostingClassification::OnPrem
    {
        found.push(candidate(
            codes::SELF_HOSTED_INFRASTRUCTURE,
            exposure,
            FindingSeverity::Medium,
            "Servers appear to be self-hosted",
            format!(
                "The addresses behind {domain} point back to your own network, so patching and \
                 monitoring them is your responsibility."
            ),
        ));
    }

    let subdomains = bundle.block(SignalCategory::Subdomains);
    if let Some(signals) = bundle.subdomains()
        && !subdomains.is_failed()
        && signals.total_found > LARGE_SUBDOMAIN_SURFACE
    {
        found.push(candidate(
            codes::LARGE_SUBDOMAIN_SURFACE,
            subdomains,
            FindingSeverity::Low,
            "Many public subdomains",
            format!(
                "Certificate logs list {} subdomains of {domain}. Each one is something that \
                 needs to be kept up to date.",
                signals.total_found
            ),
        ));
    }

    let techstack = bundle.block(SignalCategory::Techstack);
    if let Some(signals) = bundle.techstack()
        && !techstack.is_failed()
        && let Some(powered_by) = signals.powered_by.as_deref()
    {
        let versioned = powered_by.chars().any(|c| c.is_ascii_digit());
        found.push(candidate(
            codes::PLATFORM_DISCLOSED,
            techstack,
            if versioned {
                FindingSeverity::Medium
            } else {
                FindingSeverity::Low
            },
            "Website reveals its software",
            format!(
                "The website announces \"{powered_by}\" in its headers, which tells attackers \
                 exactly what to look for."
            ),
        ));
    }

    order_candidates(&mut found);
    found
}

/// Severity desc, confidence desc, category priority asc, code asc
pub fn compare_candidates(a: &CandidateFinding, b: &CandidateFinding) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.confidence.cmp(&a.confidence))
        .then_with(|| a.category.priority().cmp(&b.category.priority()))
        .then_with(|| a.finding_code.cmp(&b.finding_code))
}

pub fn order_candidates(candidates: &mut [CandidateFinding]) {
    candidates.sort_by(compare_candidates);
}

/// Low confidence is the only grade that needs hedged wording
pub fn requires_caveat(confidence: Confidence) -> bool {
    confidence == Confidence::Low
}
