//! Blog model shared by the integration tests.

#![allow(dead_code)]

use entity_loaders::memory::{MemoryContext, MemoryStore};
use entity_loaders::{Collection, Entity, EntityType, ForeignKey, Reference, collection, reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    #[serde(skip)]
    pub posts: Vec<Post>,
}

impl User {
    pub const POSTS: Collection<User, Post> = collection!(User, posts: Post);
}

/// Uses the default `refresh`, so a reload drops loaded posts.
impl Entity for User {
    const ENTITY_NAME: &'static str = "User";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u32,
    pub author_id: u32,
    pub title: String,
    #[serde(skip)]
    pub author: Option<User>,
    #[serde(skip)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub const AUTHOR: Reference<Post, User> = reference!(Post, author: User);
    pub const COMMENTS: Collection<Post, Comment> = collection!(Post, comments: Comment);

    pub fn new(id: u32, author_id: u32, title: &str) -> Self {
        Self {
            id,
            author_id,
            title: title.into(),
            author: None,
            comments: Vec::new(),
        }
    }
}

impl Entity for Post {
    const ENTITY_NAME: &'static str = "Post";
    const REFRESH_KEEPS_RELATIONS: bool = true;

    fn refresh(&mut self, fresh: Self) {
        self.author_id = fresh.author_id;
        self.title = fresh.title;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u32,
    pub post_id: u32,
    pub score: u32,
}

impl Entity for Comment {
    const ENTITY_NAME: &'static str = "Comment";
}

/// Not registered with any context.
#[derive(Debug, Serialize, Deserialize)]
pub struct Tag {
    pub id: u32,
    pub label: String,
}

impl Entity for Tag {
    const ENTITY_NAME: &'static str = "Tag";
}

/// A context over a seeded store with zeroed round-trip counters.
///
/// Users 1 and 2; posts 10 and 11 by user 1, post 12 by user 2; comments
/// 100-102 on post 10 and 110 on post 11.
pub fn blog() -> MemoryContext {
    let store = MemoryStore::new();
    for (id, name) in [(1, "Ada"), (2, "Grace")] {
        store
            .put(&User {
                id,
                name: name.into(),
                posts: Vec::new(),
            })
            .unwrap();
    }
    for (id, author_id, title) in [(10, 1, "Engines"), (11, 1, "Notes"), (12, 2, "Compilers")] {
        store.put(&Post::new(id, author_id, title)).unwrap();
    }
    for (id, post_id, score) in [(100, 10, 3), (101, 10, 12), (102, 10, 25), (110, 11, 1)] {
        store.put(&Comment { id, post_id, score }).unwrap();
    }
    store.reset_stats();

    MemoryContext::new(store)
        .with_entity(EntityType::of::<User>().collection::<Post>("posts", ForeignKey::target("author_id")))
        .with_entity(
            EntityType::of::<Post>()
                .reference::<User>("author", ForeignKey::source("author_id"))
                .collection::<Comment>("comments", ForeignKey::target("post_id")),
        )
        .with_entity(EntityType::of::<Comment>())
}

/// Read a seeded post, then zero the counters again.
pub fn find_post(ctx: &MemoryContext, id: u32) -> Post {
    let post = ctx.find::<Post>(id.to_string()).unwrap().unwrap();
    ctx.store().reset_stats();
    post
}

/// Store round-trips since the last reset.
pub fn round_trips(ctx: &MemoryContext) -> u64 {
    ctx.store().stats().total()
}
