use anyhow::{Context as _, Result};
use colored::Colorize;
use inti_client::forms::NewPost;
use inti_client::interactions::{FollowState, LikeState};
use inti_client::models::{ProfileSummary, truthy};
use inti_client::{auth, extract, normalize};
use serde_json::Value;

use crate::cli::{CreatePostArgs, DeleteArgs, PageArgs, PostCommands, SearchArgs};
use crate::commands::{created_id, read_upload};
use crate::context::Context;
use crate::output::{print_notice, print_posts, print_profiles, print_success, print_value};

pub async fn search(ctx: &Context, args: &SearchArgs) -> Result<()> {
    let results = ctx.client.search_profiles(&args.query, args.limit).await?;
    let profiles: Vec<_> = normalize::into_collection(results)
        .iter()
        .map(|p| ProfileSummary::from_record(p, ctx.base_url()))
        .collect();
    print_profiles(&profiles, ctx.format);
    Ok(())
}

/// Follows or unfollows `raw_username`, starting from the relationship the
/// profile record reports.
pub async fn set_following(ctx: &Context, raw_username: &str, follow: bool) -> Result<()> {
    ctx.require_login()?;
    let username = extract::sanitize_username(raw_username).context("Username must not be empty")?;
    let record = ctx.client.public_profile(&username, 0, 1).await?;
    let mut state = FollowState::new(ProfileSummary::from_record(&record, ctx.base_url()).is_following);

    let handle = format!("@{username}").cyan();
    if state.following == follow {
        let already = if follow { "Already following" } else { "Not following" };
        print_notice(&format!("{already} {handle}"));
        return Ok(());
    }
    state.toggle(&ctx.client, &username).await?;
    let verb = if state.following { "Following" } else { "Unfollowed" };
    print_success(&format!("{verb} {handle}"));
    Ok(())
}

pub async fn feed(ctx: &Context, args: &PageArgs) -> Result<()> {
    ctx.require_login()?;
    let posts = normalize::into_collection(ctx.client.feed(args.page, args.size).await?);
    print_posts(&posts, ctx.format);
    Ok(())
}

pub async fn post(ctx: &Context, command: &PostCommands) -> Result<()> {
    match command {
        PostCommands::Create(args) => create_post(ctx, args).await,
        PostCommands::Show(args) => {
            let post = ctx.client.post_detail(&args.id).await?;
            print_value(&post, ctx.format);
            Ok(())
        }
        PostCommands::Delete(args) => delete_post(ctx, args).await,
        PostCommands::Like(args) => set_like(ctx, &args.id, true).await,
        PostCommands::Unlike(args) => set_like(ctx, &args.id, false).await,
    }
}

fn like_state(post: &Value) -> LikeState {
    let liked = ["liked", "isLiked"]
        .iter()
        .any(|k| post.get(*k).is_some_and(truthy));
    let count = post.get("likesCount").and_then(Value::as_u64).unwrap_or(0);
    LikeState::new(liked, count)
}

async fn set_like(ctx: &Context, post_id: &str, like: bool) -> Result<()> {
    ctx.require_login()?;
    let post = ctx.client.post_detail(post_id).await?;
    let mut state = like_state(&post);
    if state.liked == like {
        let already = if like { "already liked" } else { "not liked" };
        print_notice(&format!("Post {} is {already}", post_id.cyan()));
        return Ok(());
    }
    let state = state.toggle(&ctx.client, post_id).await?;
    print_success(&format!(
        "Post {} {} ({} likes)",
        post_id.cyan(),
        if state.liked { "liked" } else { "unliked" },
        state.count
    ));
    Ok(())
}

async fn create_post(ctx: &Context, args: &CreatePostArgs) -> Result<()> {
    ctx.require_login()?;
    let post = NewPost {
        description: args.description.clone(),
        image: args.image.as_deref().map(read_upload).transpose()?,
    };
    let created = ctx.client.create_post(post).await?;
    match created_id(&created) {
        Some(id) => print_success(&format!("Published post {}", id.cyan())),
        None => print_success("Published post"),
    }
    Ok(())
}

async fn delete_post(ctx: &Context, args: &DeleteArgs) -> Result<()> {
    ctx.require_login()?;
    if !args.force {
        let post = ctx.client.post_detail(&args.id).await?;
        let me = auth::resolve_self(&ctx.client, &ctx.session).await?;
        if !auth::is_owner(&post, &me) {
            anyhow::bail!("Post {} does not belong to you (use --force to try anyway)", args.id);
        }
    }
    ctx.client.delete_post(&args.id).await?;
    print_success(&format!("Deleted post {}", args.id.cyan()));
    Ok(())
}
