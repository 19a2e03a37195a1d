//! Immutable point-in-time copies of a partition's posts.

use std::sync::Arc;

use postsync_types::{Partition, Post, PostId};

use crate::Generation;

/// Posts visible to a provider at one moment.
///
/// Cheap to clone. Order is whatever the store returned; correctness
/// checks should treat it as a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    generation: Generation,
    posts: Arc<[Post]>,
}

impl Snapshot {
    /// An empty snapshot (no connection installed).
    pub fn empty() -> Self {
        Self {
            generation: Generation::default(),
            posts: Arc::from(Vec::<Post>::new()),
        }
    }

    /// Build a snapshot of `partition`, dropping any post from another partition.
    pub fn for_partition(generation: Generation, partition: &Partition, posts: Vec<Post>) -> Self {
        let posts: Vec<Post> = posts
            .into_iter()
            .filter(|p| &p.partition == partition)
            .collect();
        Self {
            generation,
            posts: Arc::from(posts),
        }
    }

    /// Generation of the connection that produced this snapshot.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// All posts, in store order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Iterate posts.
    pub fn iter(&self) -> std::slice::Iter<'_, Post> {
        self.posts.iter()
    }

    /// Number of posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Check if there are no posts.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Look up a post by id.
    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == *id)
    }

    /// Find the unique post whose id starts with `prefix`.
    ///
    /// Accepts both hyphenated and simple (no hyphen) forms. Returns `None`
    /// if zero or several posts match.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Post> {
        let needle = prefix.replace('-', "").to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        let mut matches = self
            .posts
            .iter()
            .filter(|p| p.id.as_uuid().simple().to_string().starts_with(&needle));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Post;
    type IntoIter = std::slice::Iter<'a, Post>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Partition {
        Partition::new(name).unwrap()
    }

    #[test]
    fn empty_has_no_posts() {
        let snap = Snapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.generation(), Generation::new(0));
    }

    #[test]
    fn foreign_partition_posts_are_dropped() {
        let mine = Post::new(p("mine"), "a", "");
        let theirs = Post::new(p("theirs"), "b", "");
        let snap = Snapshot::for_partition(
            Generation::new(1),
            &p("mine"),
            vec![mine.clone(), theirs],
        );
        assert_eq!(snap.posts(), &[mine]);
    }

    #[test]
    fn preserves_store_order() {
        let a = Post::new(p("x"), "a", "");
        let b = Post::new(p("x"), "b", "");
        let snap = Snapshot::for_partition(Generation::new(1), &p("x"), vec![b.clone(), a.clone()]);
        let names: Vec<_> = snap.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn clones_share_storage() {
        let snap = Snapshot::for_partition(Generation::new(1), &p("x"), vec![Post::new(p("x"), "a", "")]);
        let copy = snap.clone();
        assert!(std::ptr::eq(snap.posts().as_ptr(), copy.posts().as_ptr()));
    }

    #[test]
    fn get_by_id() {
        let a = Post::new(p("x"), "a", "");
        let snap = Snapshot::for_partition(Generation::new(1), &p("x"), vec![a.clone()]);
        assert_eq!(snap.get(&a.id), Some(&a));
        assert!(snap.get(&PostId::new()).is_none());
    }

    #[test]
    fn find_by_prefix_accepts_full_and_short_forms() {
        let a = Post::new(p("x"), "a", "");
        let snap = Snapshot::for_partition(Generation::new(1), &p("x"), vec![a.clone()]);
        assert_eq!(snap.find_by_prefix(&a.id.short()), Some(&a));
        assert_eq!(snap.find_by_prefix(&a.id.to_string()), Some(&a));
        assert!(snap.find_by_prefix("").is_none());
    }

    #[test]
    fn find_by_prefix_rejects_ambiguous() {
        let posts: Vec<Post> = (0..40).map(|i| Post::new(p("x"), &i.to_string(), "")).collect();
        let snap = Snapshot::for_partition(Generation::new(1), &p("x"), posts);
        // With 40 posts at least two share a leading hex digit
        let ambiguous = (0..16)
            .map(|d| format!("{:x}", d))
            .find(|d| snap.iter().filter(|p| p.id.short().starts_with(d.as_str())).count() > 1)
            .unwrap();
        assert!(snap.find_by_prefix(&ambiguous).is_none());
    }
}
