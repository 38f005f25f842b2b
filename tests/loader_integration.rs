//! Integration tests for single-entity loaders.
//!
//! These tests verify loader behavior against the in-memory context:
//! - The persisted-state guard
//! - Load idempotence and reload on every call
//! - Deferred relation queries
//! - Construction errors

mod common;

use common::{Comment, Post, Tag, User, blog, find_post, round_trips};
use entity_loaders::memory::{MemoryContext, MemoryError};
use entity_loaders::{
    EntityState, ErrorCode, Loader, LoaderExt, PersistenceContext, RelationQuery, get_loader,
};
use pretty_assertions::assert_eq;

#[test]
fn test_fresh_entity_makes_no_store_call() {
    let ctx = blog();
    let mut post = Post::new(50, 1, "Fresh");

    let mut loader = get_loader(&ctx, &mut post).unwrap();
    loader.load(Post::AUTHOR).unwrap();
    loader.load(Post::COMMENTS).unwrap();
    loader.reload().unwrap();

    assert_eq!(round_trips(&ctx), 0);
    assert_eq!(post.author, None);
    assert!(post.comments.is_empty());
}

#[test]
fn test_unchanged_entity_loads_once() {
    let ctx = blog();
    let mut post = find_post(&ctx, 10);

    let mut loader = ctx.loader(&mut post).unwrap();
    assert_eq!(loader.state(), EntityState::Unchanged);

    loader.load(Post::AUTHOR).unwrap();
    assert_eq!(round_trips(&ctx), 1);
    assert_eq!(
        loader.entity().author.as_ref().map(|user| user.name.as_str()),
        Some("Ada")
    );

    loader.load(Post::AUTHOR).unwrap();
    assert_eq!(round_trips(&ctx), 1);
}

#[test]
fn test_modified_entity_loads_collection_once() {
    let ctx = blog();
    let mut post = find_post(&ctx, 10);
    post.title = "Difference Engines".into();
    ctx.update(&post).unwrap();

    let mut loader = ctx.loader(&mut post).unwrap();
    assert_eq!(loader.state(), EntityState::Modified);

    loader.load(Post::COMMENTS).unwrap();
    loader.load(Post::COMMENTS).unwrap();
    assert_eq!(round_trips(&ctx), 1);

    let ids: Vec<u32> = post.comments.iter().map(|comment| comment.id).collect();
    assert_eq!(ids, vec![100, 101, 102]);
}

#[test]
fn test_added_and_deleted_entities_are_skipped() {
    let ctx = blog();

    let mut draft = Post::new(60, 1, "Draft");
    ctx.add(&draft).unwrap();

    let mut removed = find_post(&ctx, 11);
    ctx.remove(&removed).unwrap();

    for post in [&mut draft, &mut removed] {
        let mut loader = ctx.loader(post).unwrap();
        assert!(!loader.is_persisted());

        loader.reload().unwrap();
        loader.load(Post::AUTHOR).unwrap();
        assert!(loader.load_query(Post::COMMENTS).unwrap().is_short_circuited());
    }

    assert_eq!(round_trips(&ctx), 0);
}

#[test]
fn test_reload_runs_on_every_call() {
    let ctx = blog();
    let mut post = find_post(&ctx, 12);
    post.title = "local edit".into();
    ctx.update(&post).unwrap();

    let mut loader = ctx.loader(&mut post).unwrap();
    loader.reload().unwrap();
    assert_eq!(loader.entity().title, "Compilers");
    assert_eq!(loader.state(), EntityState::Unchanged);

    loader.reload().unwrap();
    loader.reload().unwrap();
    assert_eq!(ctx.store().stats().reads, 3);
}

#[test]
fn test_reload_keeps_loaded_relations() {
    let ctx = blog();
    let mut post = find_post(&ctx, 10);

    let mut loader = ctx.loader(&mut post).unwrap();
    loader.load(Post::AUTHOR).unwrap();
    loader.reload().unwrap();
    loader.load(Post::AUTHOR).unwrap();

    assert_eq!(round_trips(&ctx), 2);
    assert!(post.author.is_some());
}

#[test]
fn test_each_found_instance_loads_its_own_relations() {
    let ctx = blog();
    let mut first = find_post(&ctx, 10);
    ctx.loader(&mut first).unwrap().load(Post::COMMENTS).unwrap();
    assert_eq!(first.comments.len(), 3);

    let mut second = find_post(&ctx, 10);
    assert!(second.comments.is_empty());
    ctx.loader(&mut second).unwrap().load(Post::COMMENTS).unwrap();
    assert_eq!(second.comments.len(), 3);
    assert_eq!(round_trips(&ctx), 1);
}

#[test]
fn test_reload_with_default_refresh_allows_loading_again() {
    let ctx = blog();
    let mut user: User = ctx.find("1").unwrap().unwrap();
    ctx.store().reset_stats();

    let mut loader = ctx.loader(&mut user).unwrap();
    loader.load(User::POSTS).unwrap();
    assert_eq!(loader.entity().posts.len(), 2);

    loader.reload().unwrap();
    assert!(loader.entity().posts.is_empty());
    loader.load(User::POSTS).unwrap();

    assert_eq!(user.posts.len(), 2);
    assert_eq!(round_trips(&ctx), 3);
}

#[test]
fn test_value_with_tracked_key_is_the_tracked_entity() {
    let ctx = blog();
    let _tracked = find_post(&ctx, 10);

    let mut copy = Post::new(10, 1, "built by hand");
    let mut loader = ctx.loader(&mut copy).unwrap();
    assert_eq!(loader.state(), EntityState::Unchanged);
    loader.load(Post::AUTHOR).unwrap();

    assert_eq!(round_trips(&ctx), 1);
    assert!(copy.author.is_some());
}

#[test]
fn test_load_query_on_unpersisted_entity_is_empty() {
    let ctx = blog();
    let mut post = Post::new(10, 1, "same key, never attached");

    let loader = ctx.loader(&mut post).unwrap();
    let query = loader.load_query(Post::COMMENTS).unwrap();

    assert!(query.is_short_circuited());
    assert_eq!(query.fetch().unwrap(), Vec::<Comment>::new());
    assert_eq!(query.count().unwrap(), 0);
    assert_eq!(loader.load_query(Post::AUTHOR).unwrap().first().unwrap(), None);
    assert_eq!(round_trips(&ctx), 0);
}

#[test]
fn test_load_query_is_deferred_and_composable() {
    let ctx = blog();
    let mut post = find_post(&ctx, 10);
    let loader = ctx.loader(&mut post).unwrap();

    let popular = loader
        .load_query(Post::COMMENTS)
        .unwrap()
        .filter(|comment: &Comment| comment.score > 10);
    assert_eq!(round_trips(&ctx), 0);

    let ids: Vec<u32> = popular.fetch().unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![101, 102]);

    let top = popular.take(1);
    assert_eq!(top.fetch().unwrap().len(), 1);
    assert_eq!(round_trips(&ctx), 2);

    // querying never marks the relation loaded
    assert!(!ctx.is_collection_loaded(loader.entity(), Post::COMMENTS));
}

#[test]
fn test_load_query_reference() {
    let ctx = blog();
    let mut post = find_post(&ctx, 12);
    let loader = ctx.loader(&mut post).unwrap();

    let author = loader.load_query(Post::AUTHOR).unwrap().first().unwrap();
    assert_eq!(author.map(|user| user.name), Some("Grace".to_string()));
    assert!(!ctx.is_reference_loaded(loader.entity(), Post::AUTHOR));
}

#[test]
fn test_loaded_relations_can_be_loaded_from() {
    let ctx = blog();
    let mut post = find_post(&ctx, 11);
    ctx.loader(&mut post).unwrap().load(Post::AUTHOR).unwrap();

    let mut author: User = post.author.take().unwrap();
    assert_eq!(ctx.state(&author), EntityState::Unchanged);

    ctx.loader(&mut author).unwrap().load(User::POSTS).unwrap();
    let titles: Vec<&str> = author.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Engines", "Notes"]);
}

#[test]
fn test_unmapped_entity_type() {
    let ctx = blog();
    let mut tag = Tag {
        id: 1,
        label: "rust".into(),
    };

    let err = ctx.loader(&mut tag).unwrap_err();
    assert_eq!(err.code, ErrorCode::ModelMismatch);
    assert_eq!(
        err.message,
        "The entity type Tag is not part of the model for the current context. \
         Verify the entity is configured with the context and not a complex type."
    );
    assert!(err.to_string().starts_with("[EL1002]"));
}

#[test]
fn test_absent_arguments() {
    let ctx = blog();
    let mut post = Post::new(1, 1, "x");

    let err = get_loader::<MemoryContext, Post>(None, &mut post).unwrap_err();
    assert!(err.is_null_argument());
    assert_eq!(err.context.argument.as_deref(), Some("context"));

    let err = get_loader::<MemoryContext, Post>(&ctx, None).unwrap_err();
    assert!(err.is_null_argument());
    assert_eq!(err.context.argument.as_deref(), Some("entity"));
}

#[test]
fn test_context_errors_pass_through() {
    let ctx = blog();
    let mut post = find_post(&ctx, 10);
    ctx.store().set_offline(true);

    let mut loader = ctx.loader(&mut post).unwrap();
    assert!(matches!(loader.load(Post::AUTHOR), Err(MemoryError::Offline)));
    assert!(matches!(loader.reload(), Err(MemoryError::Offline)));

    let query = loader.load_query(Post::COMMENTS).unwrap();
    assert!(matches!(query.fetch(), Err(MemoryError::Offline)));
}
