//! Result synthesis.
//!
//! Merges a profile and the discovered commit emails into a
//! presentation-ready [`ResultRecord`]. Pure and total.

use crate::models::{CommitEmailSet, ProfileRecord, Provenance, ResultRecord, NOREPLY_DOMAIN};

/// Build the generated noreply address GitHub assigns to an account.
pub fn synthetic_noreply(numeric_id: u64, handle: &str) -> String {
    format!("{}+{}@{}", numeric_id, handle, NOREPLY_DOMAIN)
}

/// Combine profile data and commit emails.
///
/// Priority: every commit email in order, then the public profile email,
/// then (only if nothing else was found) a synthetic noreply address.
pub fn synthesize(profile: &ProfileRecord, commit_emails: &CommitEmailSet) -> ResultRecord {
    let display_name = profile
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(profile.handle.as_str())
        .to_string();

    let mut emails: Vec<String> = Vec::new();
    let mut push_unique = |email: &str| {
        if !emails.iter().any(|e| e == email) {
            emails.push(email.to_string());
        }
    };

    for email in commit_emails.iter() {
        push_unique(email);
    }

    let profile_email = profile
        .public_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());
    if let Some(email) = profile_email {
        push_unique(email);
    }

    let provenance = if !commit_emails.is_empty() {
        Provenance::FoundInCommits
    } else if profile_email.is_some() {
        Provenance::FoundInProfile
    } else {
        Provenance::SyntheticNoreply
    };

    if emails.is_empty() {
        emails.push(synthetic_noreply(profile.numeric_id, &profile.handle));
    }

    ResultRecord {
        display_name,
        emails,
        provenance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: Option<&str>, email: Option<&str>) -> ProfileRecord {
        ProfileRecord {
            handle: "octocat".to_string(),
            display_name: name.map(String::from),
            public_email: email.map(String::from),
            numeric_id: 583231,
        }
    }

    #[test]
    fn test_commit_emails_take_priority() {
        let emails: CommitEmailSet = ["a@x.com", "c@z.com"].into_iter().collect();
        let result = synthesize(&profile(Some("The Octocat"), Some("b@y.com")), &emails);
        assert_eq!(result.display_name, "The Octocat");
        assert_eq!(result.emails, vec!["a@x.com", "c@z.com", "b@y.com"]);
        assert_eq!(result.provenance, Provenance::FoundInCommits);
    }

    #[test]
    fn test_profile_email_deduplicated_against_commits() {
        let emails: CommitEmailSet = ["b@y.com", "a@x.com"].into_iter().collect();
        let result = synthesize(&profile(None, Some("a@x.com")), &emails);
        assert_eq!(result.emails, vec!["b@y.com", "a@x.com"]);
        assert_eq!(result.provenance, Provenance::FoundInCommits);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let emails: CommitEmailSet = ["a@x.com"].into_iter().collect();
        let result = synthesize(&profile(None, Some("A@x.com")), &emails);
        assert_eq!(result.emails, vec!["a@x.com", "A@x.com"]);
    }

    #[test]
    fn test_profile_email_only() {
        let result = synthesize(&profile(None, Some("b@y.com")), &CommitEmailSet::new());
        assert_eq!(result.emails, vec!["b@y.com"]);
        assert_eq!(result.provenance, Provenance::FoundInProfile);
    }

    #[test]
    fn test_synthetic_fallback() {
        let result = synthesize(&profile(None, None), &CommitEmailSet::new());
        assert_eq!(result.emails, vec!["583231+octocat@users.noreply.github.com"]);
        assert_eq!(result.provenance, Provenance::SyntheticNoreply);
    }

    #[test]
    fn test_blank_profile_email_falls_through_to_synthetic() {
        let result = synthesize(&profile(None, Some("  ")), &CommitEmailSet::new());
        assert_eq!(result.emails.len(), 1);
        assert_eq!(result.provenance, Provenance::SyntheticNoreply);
    }

    #[test]
    fn test_display_name_falls_back_to_handle() {
        let empty = CommitEmailSet::new();
        assert_eq!(synthesize(&profile(None, None), &empty).display_name, "octocat");
        assert_eq!(synthesize(&profile(Some(""), None), &empty).display_name, "octocat");
        assert_eq!(
            synthesize(&profile(Some(" Mona "), None), &empty).display_name,
            "Mona"
        );
    }

    #[test]
    fn test_never_empty() {
        let cases = [
            (None, None),
            (Some("n"), None),
            (None, Some("e@x.com")),
            (Some("n"), Some("e@x.com")),
        ];
        for (name, email) in cases {
            let result = synthesize(&profile(name, email), &CommitEmailSet::new());
            assert!(!result.emails.is_empty());
        }
    }
}
