//! # Resource Classification
//!
//! Maps request paths onto a closed set of [`ResourceType`]s. The type picks the
//! cache policy an entry is written with and drives type-based invalidation,
//! including the one-level cascade to related resource types.
//!
//! # Examples
//!
//! ```
//! use tutorcache_core::{Classifier, ResourceType};
//!
//! let classifier = Classifier::default();
//! assert_eq!(classifier.classify("/tutors/42"), Some(ResourceType::Tutors));
//! assert_eq!(classifier.classify("/tutors/42/profile"), Some(ResourceType::TutorProfile));
//! assert_eq!(classifier.classify("/weather"), None);
//!
//! assert_eq!(
//!     ResourceType::Tutors.related(),
//!     &[ResourceType::TutorProfile, ResourceType::Favorites]
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{CacheConfig, CacheError};

const SECOND: u64 = 1_000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Coarse resource families of the marketplace REST API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Users,
    Profile,
    Tutors,
    TutorProfile,
    Bookings,
    Reviews,
    Messages,
    Notifications,
    Packages,
    Favorites,
    Subjects,
    Admin,
    Owner,
    Availability,
}

impl ResourceType {
    pub const ALL: [ResourceType; 14] = [
        ResourceType::Users,
        ResourceType::Profile,
        ResourceType::Tutors,
        ResourceType::TutorProfile,
        ResourceType::Bookings,
        ResourceType::Reviews,
        ResourceType::Messages,
        ResourceType::Notifications,
        ResourceType::Packages,
        ResourceType::Favorites,
        ResourceType::Subjects,
        ResourceType::Admin,
        ResourceType::Owner,
        ResourceType::Availability,
    ];

    /// The kebab-case name, which is also the substring used for pattern invalidation.
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceType::Users => "users",
            ResourceType::Profile => "profile",
            ResourceType::Tutors => "tutors",
            ResourceType::TutorProfile => "tutor-profile",
            ResourceType::Bookings => "bookings",
            ResourceType::Reviews => "reviews",
            ResourceType::Messages => "messages",
            ResourceType::Notifications => "notifications",
            ResourceType::Packages => "packages",
            ResourceType::Favorites => "favorites",
            ResourceType::Subjects => "subjects",
            ResourceType::Admin => "admin",
            ResourceType::Owner => "owner",
            ResourceType::Availability => "availability",
        }
    }

    /// Resource types whose cached entries go stale when this one changes.
    ///
    /// Expanded exactly one level by the invalidation engine; the graph is never
    /// walked transitively, so cycles here are harmless.
    pub const fn related(self) -> &'static [ResourceType] {
        use ResourceType::*;
        match self {
            Users => &[Profile, Admin],
            Profile => &[Users],
            Tutors => &[TutorProfile, Favorites],
            TutorProfile => &[Tutors],
            Bookings => &[Availability, Notifications, Packages],
            Reviews => &[Tutors, TutorProfile],
            Messages => &[Notifications],
            Notifications => &[],
            Packages => &[Bookings],
            Favorites => &[Tutors],
            Subjects => &[Tutors],
            Admin => &[Users, Tutors, Bookings],
            Owner => &[Admin],
            Availability => &[Bookings, TutorProfile],
        }
    }

    /// Built-in cache policy for this resource type.
    pub const fn default_policy(self) -> CacheConfig {
        use ResourceType::*;
        match self {
            Users | Profile | Tutors | Reviews => CacheConfig::new(5 * MINUTE, 30 * MINUTE, true),
            TutorProfile | Packages => CacheConfig::new(10 * MINUTE, HOUR, true),
            Bookings | Availability | Admin | Owner => CacheConfig::new(MINUTE, 5 * MINUTE, true),
            Favorites => CacheConfig::new(2 * MINUTE, 10 * MINUTE, true),
            Subjects => CacheConfig::new(HOUR, 24 * HOUR, true),
            Notifications => CacheConfig::new(30 * SECOND, 2 * MINUTE, true),
            Messages => CacheConfig::new(10 * SECOND, MINUTE, false),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CacheError::UnknownResource(s.to_string()))
    }
}

/// A compiled `(pattern, type)` classification rule.
#[derive(Clone, Debug)]
pub struct ClassifierRule {
    pattern: Regex,
    resource: ResourceType,
}

impl ClassifierRule {
    /// Compiles a rule. Fails only on an invalid regular expression.
    pub fn new(pattern: &str, resource: ResourceType) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            resource,
        })
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

// Paths are matched relative to the API root; see `Classifier::with_base_path`.
// Top-level collections are anchored at the root, nested sub-resources match at
// any depth. Order matters: sub-resources must precede the parent collection
// they live under.
const DEFAULT_RULES: &[(&str, ResourceType)] = &[
    (r"^/?admin(/|$|\?)", ResourceType::Admin),
    (r"^/?owner(/|$|\?)", ResourceType::Owner),
    (r"^/?(users/me|me|profile)(/|$|\?)", ResourceType::Profile),
    (r"^/?tutors/(me|[^/?]+)/profile(/|$|\?)", ResourceType::TutorProfile),
    (r"^/?tutor/profile(/|$|\?)", ResourceType::TutorProfile),
    (r"(^|/)availability(/|$|\?)", ResourceType::Availability),
    (r"(^|/)reviews(/|$|\?)", ResourceType::Reviews),
    (r"(^|/)favorites(/|$|\?)", ResourceType::Favorites),
    (r"(^|/)packages(/|$|\?)", ResourceType::Packages),
    (r"(^|/)bookings(/|$|\?)", ResourceType::Bookings),
    (r"(^|/)(messages|conversations)(/|$|\?)", ResourceType::Messages),
    (r"(^|/)notifications(/|$|\?)", ResourceType::Notifications),
    (r"(^|/)subjects(/|$|\?)", ResourceType::Subjects),
    (r"^/?tutors(/|$|\?)", ResourceType::Tutors),
    (r"^/?users(/|$|\?)", ResourceType::Users),
];

static DEFAULT_CLASSIFIER: Lazy<Classifier> = Lazy::new(|| {
    let rules = DEFAULT_RULES
        .iter()
        .filter_map(|(pattern, resource)| ClassifierRule::new(pattern, *resource).ok())
        .collect();
    Classifier::new(rules)
});

/// Ordered rule list that infers a [`ResourceType`] from a request path.
///
/// Rules are evaluated left to right and the first match wins. A path that no
/// rule matches classifies as `None`: it is cached under the default policy and
/// is invisible to type-based invalidation.
///
/// The default rules expect paths relative to the API root (`/tutors/7`, not
/// `/api/v1/tutors/7`). When the transport passes full paths, set the prefix
/// with [`with_base_path`](Self::with_base_path) so it is stripped first.
#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
    base_path: Option<String>,
}

impl Classifier {
    /// Creates a classifier from an explicit, already ordered rule list.
    pub fn new(rules: Vec<ClassifierRule>) -> Self {
        Self {
            rules,
            base_path: None,
        }
    }

    /// Strips `base_path` (e.g. `/api/v1`) from paths before matching.
    ///
    /// Only a whole leading segment sequence is stripped: with `/api`,
    /// `/api/tutors` becomes `/tutors` but `/apis/tutors` is left alone.
    ///
    /// ```
    /// use tutorcache_core::{Classifier, ResourceType};
    ///
    /// let classifier = Classifier::default().with_base_path("/api/v1/");
    /// assert_eq!(classifier.classify("/api/v1/tutors/3"), Some(ResourceType::Tutors));
    /// assert_eq!(Classifier::default().classify("/api/v1/tutors/3"), None);
    /// ```
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        let trimmed = base_path.trim().trim_end_matches('/');
        self.base_path = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Returns the first matching resource type, if any.
    pub fn classify(&self, path: &str) -> Option<ResourceType> {
        let path = self.relative(path.trim());
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(ClassifierRule::resource)
    }

    fn relative<'p>(&self, path: &'p str) -> &'p str {
        let Some(base) = self.base_path.as_deref() else {
            return path;
        };
        match path.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '?']) => rest,
            _ => path,
        }
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }
}

impl Default for Classifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_compile() {
        assert_eq!(Classifier::default().rules().len(), DEFAULT_RULES.len());
    }

    #[test]
    fn test_collections_and_items() {
        let c = Classifier::default();
        assert_eq!(c.classify("/tutors"), Some(ResourceType::Tutors));
        assert_eq!(c.classify("/tutors/42"), Some(ResourceType::Tutors));
        assert_eq!(c.classify("tutors?subject=math"), Some(ResourceType::Tutors));
        assert_eq!(c.classify("/users/7"), Some(ResourceType::Users));
        assert_eq!(c.classify("/bookings/9/cancel"), Some(ResourceType::Bookings));
        assert_eq!(c.classify("/conversations/3"), Some(ResourceType::Messages));
        assert_eq!(c.classify("/notifications"), Some(ResourceType::Notifications));
        assert_eq!(c.classify("/subjects"), Some(ResourceType::Subjects));
    }

    #[test]
    fn test_specific_rules_win_over_parents() {
        let c = Classifier::default();
        assert_eq!(c.classify("/users/me"), Some(ResourceType::Profile));
        assert_eq!(c.classify("/users/me/avatar"), Some(ResourceType::Profile));
        assert_eq!(c.classify("/tutors/42/profile"), Some(ResourceType::TutorProfile));
        assert_eq!(c.classify("/tutor/profile"), Some(ResourceType::TutorProfile));
        assert_eq!(c.classify("/tutors/42/availability"), Some(ResourceType::Availability));
        assert_eq!(c.classify("/tutors/42/reviews"), Some(ResourceType::Reviews));
        assert_eq!(c.classify("/students/5/favorites"), Some(ResourceType::Favorites));
        assert_eq!(c.classify("/admin/users"), Some(ResourceType::Admin));
        assert_eq!(c.classify("/owner/stats"), Some(ResourceType::Owner));
    }

    #[test]
    fn test_prefix_lookalikes_do_not_match() {
        let c = Classifier::default();
        assert_eq!(c.classify("/tutorsfeed"), None);
        assert_eq!(c.classify("/administrators"), None);
        assert_eq!(c.classify("/health"), None);
        assert_eq!(c.classify(""), None);
    }

    #[test]
    fn test_nested_and_top_level_rules_share_the_root() {
        let c = Classifier::default();
        assert_eq!(c.classify("bookings/9"), Some(ResourceType::Bookings));
        assert_eq!(c.classify("tutors/9"), Some(ResourceType::Tutors));
        // Without a base path only nested sub-resources survive a prefix
        assert_eq!(c.classify("/api/tutors/1"), None);
        assert_eq!(c.classify("/api/bookings/1"), Some(ResourceType::Bookings));

        let api = Classifier::default().with_base_path("/api");
        assert_eq!(api.base_path(), Some("/api"));
        assert_eq!(api.classify("/api/tutors/1"), Some(ResourceType::Tutors));
        assert_eq!(api.classify("/api/bookings/1"), Some(ResourceType::Bookings));
        assert_eq!(api.classify("/api/users/me"), Some(ResourceType::Profile));
        assert_eq!(api.classify("/api?page=2"), None);
        assert_eq!(api.classify("/apis/tutors"), None);
        assert_eq!(api.classify("/tutors"), Some(ResourceType::Tutors));
    }

    #[test]
    fn test_empty_base_path_is_ignored() {
        assert_eq!(Classifier::default().with_base_path(" / ").base_path(), None);
    }

    #[test]
    fn test_custom_rules_first_match_wins() {
        let c = Classifier::new(vec![
            ClassifierRule::new("^/a", ResourceType::Admin).unwrap(),
            ClassifierRule::new("^/a/b", ResourceType::Bookings).unwrap(),
        ]);
        assert_eq!(c.classify("/a/b"), Some(ResourceType::Admin));
    }

    #[test]
    fn test_invalid_rule_pattern() {
        assert!(ClassifierRule::new("(", ResourceType::Users).is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for resource in ResourceType::ALL {
            assert_eq!(resource.as_str().parse::<ResourceType>().unwrap(), resource);
        }
        assert!(matches!(
            "lessons".parse::<ResourceType>(),
            Err(CacheError::UnknownResource(name)) if name == "lessons"
        ));
    }

    #[test]
    fn test_default_policies_are_valid() {
        for resource in ResourceType::ALL {
            let policy = resource.default_policy();
            assert!(policy.cache_time_ms >= policy.stale_time_ms, "{resource}");
        }
        assert!(!ResourceType::Messages.default_policy().swr);
    }

    #[test]
    fn test_related_graph_never_points_to_self() {
        for resource in ResourceType::ALL {
            assert!(!resource.related().contains(&resource), "{resource}");
        }
    }
}
