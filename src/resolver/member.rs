//! Fuzzy member-name resolution.
//!
//! Member names arrive as conversational text: full names, bare first
//! names, or noisy strings like "Michael Huang (the one from the sync)".
//! Resolution runs against an in-memory index built lazily from the full
//! member table and cached until explicitly invalidated, so a rename or a
//! new member is visible only after [`MemberResolver::invalidate`] or
//! [`MemberResolver::reload`].

use std::collections::HashMap;
use std::sync::Arc;

use strsim::normalized_levenshtein;
use tokio::sync::RwLock;

use crate::config::ResolverConfig;
use crate::error::StoreError;
use crate::models::Member;
use crate::store::Store;

/// Strip trailing parenthetical commentary and dangling punctuation, then
/// casefold. `"Michael Huang (the coolest!),"` becomes `"michael huang"`.
fn clean_name(raw: &str) -> String {
    let cleaned = raw.split('(').next().unwrap_or("").trim();
    let cleaned = cleaned.trim_end_matches([',', ';', '.', '-']).trim();
    cleaned.to_lowercase()
}

/// Immutable snapshot of the member table, indexed for name lookup.
pub struct MemberIndex {
    /// lowercased full name -> member
    by_full_name: HashMap<String, Member>,
    /// lowercased first name -> every member sharing it
    by_first_name: HashMap<String, Vec<Member>>,
}

impl MemberIndex {
    pub fn new(members: Vec<Member>) -> Self {
        let mut by_full_name = HashMap::new();
        let mut by_first_name: HashMap<String, Vec<Member>> = HashMap::new();
        for member in members {
            let Some(first) = member.name.split_whitespace().next() else {
                continue;
            };
            by_first_name
                .entry(first.to_lowercase())
                .or_default()
                .push(member.clone());
            by_full_name.insert(member.name.to_lowercase(), member);
        }
        Self {
            by_full_name,
            by_first_name,
        }
    }

    /// Resolve a raw name against this snapshot.
    ///
    /// Tiers, in order: exact full-name match on the cleaned input; a
    /// single-word query matching exactly one member's first name; the
    /// best full-name fuzzy score at or above the configured cutoff. A
    /// first name shared by two members falls through to fuzzy scoring,
    /// where short queries score well below the cutoff against any full
    /// name, so the lookup misses rather than guessing.
    pub fn lookup(&self, raw: &str, config: &ResolverConfig) -> Option<&Member> {
        let key = clean_name(raw);
        if key.is_empty() {
            return None;
        }

        if let Some(member) = self.by_full_name.get(&key) {
            return Some(member);
        }

        if config.first_name_shortcut && !key.contains(' ') {
            if let Some(matches) = self.by_first_name.get(&key) {
                if let [only] = matches.as_slice() {
                    return Some(only);
                }
            }
        }

        self.by_full_name
            .iter()
            .map(|(name, member)| (normalized_levenshtein(&key, name), member))
            .filter(|(score, _)| *score >= config.fuzzy_cutoff)
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, member)| member)
    }

    pub fn len(&self) -> usize {
        self.by_full_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_full_name.is_empty()
    }
}

/// Lazily-built, explicitly-invalidated member name resolver.
pub struct MemberResolver {
    store: Arc<dyn Store>,
    config: ResolverConfig,
    index: RwLock<Option<Arc<MemberIndex>>>,
}

impl MemberResolver {
    pub fn new(store: Arc<dyn Store>, config: ResolverConfig) -> Self {
        Self {
            store,
            config,
            index: RwLock::new(None),
        }
    }

    /// Resolve a conversational member name, building the index on first
    /// use.
    pub async fn resolve(&self, raw: &str) -> Result<Option<Member>, StoreError> {
        let index = self.snapshot().await?;
        Ok(index.lookup(raw, &self.config).cloned())
    }

    /// Drop the cached index; the next lookup rebuilds it.
    pub async fn invalidate(&self) {
        *self.index.write().await = None;
    }

    /// Rebuild the index from the store immediately.
    pub async fn reload(&self) -> Result<(), StoreError> {
        let members = self.store.list_members().await?;
        *self.index.write().await = Some(Arc::new(MemberIndex::new(members)));
        Ok(())
    }

    /// Current index, building it if absent. Double-checked under the
    /// write lock so concurrent first lookups build at most twice.
    pub async fn snapshot(&self) -> Result<Arc<MemberIndex>, StoreError> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }
        let mut slot = self.index.write().await;
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }
        let members = self.store.list_members().await?;
        let index = Arc::new(MemberIndex::new(members));
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, name: &str) -> Member {
        Member {
            id,
            name: name.to_string(),
            chat_id: None,
            role: None,
            subgroup: None,
            email: None,
        }
    }

    fn index() -> MemberIndex {
        MemberIndex::new(vec![
            member(1, "Michael Huang"),
            member(2, "Sam Smith"),
            member(3, "Sam Torres"),
            member(4, "Andy Shang"),
        ])
    }

    #[test]
    fn cleaning_strips_commentary_and_punctuation() {
        assert_eq!(
            clean_name("Michael Huang (the coolest person in the world!)"),
            "michael huang"
        );
        assert_eq!(clean_name("  Andy Shang,- "), "andy shang");
        assert_eq!(clean_name("(nothing before the paren)"), "");
    }

    #[test]
    fn exact_full_name_wins() {
        let idx = index();
        let cfg = ResolverConfig::default();
        assert_eq!(idx.lookup("michael huang", &cfg).map(|m| m.id), Some(1));
        assert_eq!(idx.lookup("  Michael Huang  ", &cfg).map(|m| m.id), Some(1));
    }

    #[test]
    fn noisy_input_resolves_via_cleaning() {
        let idx = index();
        let cfg = ResolverConfig::default();
        assert_eq!(
            idx.lookup("Michael Huang (the coolest person!)", &cfg)
                .map(|m| m.id),
            Some(1)
        );
    }

    #[test]
    fn unique_first_name_resolves() {
        let idx = index();
        let cfg = ResolverConfig::default();
        assert_eq!(idx.lookup("michael", &cfg).map(|m| m.id), Some(1));
        assert_eq!(idx.lookup("Andy", &cfg).map(|m| m.id), Some(4));
    }

    #[test]
    fn shared_first_name_does_not_guess() {
        let idx = index();
        let cfg = ResolverConfig::default();
        // Two Sams: the shortcut declines, and "sam" scores 3/9 against
        // "sam smith", well under the 0.6 cutoff.
        assert!(idx.lookup("sam", &cfg).is_none());
        // Full names still disambiguate.
        assert_eq!(idx.lookup("Sam Torres", &cfg).map(|m| m.id), Some(3));
    }

    #[test]
    fn fuzzy_catches_small_typos() {
        let idx = index();
        let cfg = ResolverConfig::default();
        assert_eq!(idx.lookup("Micheal Huang", &cfg).map(|m| m.id), Some(1));
        assert_eq!(idx.lookup("andy shag", &cfg).map(|m| m.id), Some(4));
    }

    #[test]
    fn garbage_misses() {
        let idx = index();
        let cfg = ResolverConfig::default();
        assert!(idx.lookup("Zebra Quixote", &cfg).is_none());
        assert!(idx.lookup("", &cfg).is_none());
        assert!(idx.lookup("   ", &cfg).is_none());
    }

    #[test]
    fn shortcut_can_be_disabled() {
        let idx = index();
        let cfg = ResolverConfig {
            first_name_shortcut: false,
            ..ResolverConfig::default()
        };
        assert!(idx.lookup("michael", &cfg).is_none());
    }

    #[test]
    fn blank_member_names_are_skipped() {
        let idx = MemberIndex::new(vec![member(1, ""), member(2, "   "), member(3, "Ada Byron")]);
        assert_eq!(idx.len(), 1);
        let cfg = ResolverConfig::default();
        assert_eq!(idx.lookup("ada", &cfg).map(|m| m.id), Some(3));
    }

    #[tokio::test]
    async fn resolver_sees_new_members_only_after_invalidate() {
        use crate::store::MemStore;

        let store = Arc::new(MemStore::new());
        store.seed_member("Ada Byron", None, None, None, None);
        let resolver = MemberResolver::new(store.clone(), ResolverConfig::default());

        assert!(resolver.resolve("Ada Byron").await.unwrap().is_some());

        store.seed_member("Grace Hopper", None, None, None, None);
        // Cached snapshot predates the insert.
        assert!(resolver.resolve("Grace Hopper").await.unwrap().is_none());

        resolver.invalidate().await;
        assert!(resolver.resolve("Grace Hopper").await.unwrap().is_some());
    }
}
