use anyhow::{Context as _, Result};
use inti_client::forms::ProfileUpdate;
use inti_client::models::ProfileSummary;
use inti_client::posts::{POSTS_PAGE_SIZE, collect_profile_posts, sort_newest_first};
use inti_client::{ProfileView, SessionStore, extract, normalize};
use serde_json::Value;

use crate::cli::{EditProfileArgs, ProfileArgs};
use crate::commands::read_upload;
use crate::context::Context;
use crate::output::{print_posts, print_profile, print_success};

/// Opens the view on `username`, or on the logged-in profile when absent.
pub fn open(ctx: &Context, username: Option<&str>) -> Result<ProfileView> {
    let view = ctx.view();
    match username {
        Some(raw) => {
            let username = extract::sanitize_username(raw).context("Username must not be empty")?;
            view.navigate(&username);
        }
        None => {
            ctx.require_login()?;
            view.navigate_own(ctx.session.user.clone());
        }
    }
    Ok(view)
}

pub async fn show(ctx: &Context, args: &ProfileArgs) -> Result<()> {
    let view = open(ctx, args.username.as_deref())?;
    let record = view.load_profile().await?;
    print_profile(&ProfileSummary::from_record(&record, ctx.base_url()), ctx.format);

    if args.posts {
        let posts = if args.username.is_some() {
            let mut posts = normalize::embedded(&record, "posts").unwrap_or_default();
            sort_newest_first(&mut posts);
            posts
        } else {
            let first = ctx.client.my_profile(0, POSTS_PAGE_SIZE).await?;
            let initial = normalize::embedded(&first, "posts").unwrap_or_default();
            collect_profile_posts(&ctx.client, initial).await?
        };
        print_posts(&posts, ctx.format);
    }
    Ok(())
}

/// Applies field edits and then the picture upload, in that order.
pub async fn edit(ctx: &Context, args: &EditProfileArgs) -> Result<()> {
    ctx.require_login()?;
    let update = ProfileUpdate {
        name: args.name.clone(),
        username: args.username.clone(),
        bio: args.bio.clone(),
    };
    if update.is_empty() && args.picture.is_none() {
        anyhow::bail!("Nothing to change. Pass --name, --username, --bio or --picture");
    }

    if !update.is_empty() {
        let updated = ctx.client.update_profile(update).await?;
        remember_username(ctx, &updated)?;
        print_success("Profile updated");
    }
    if let Some(path) = &args.picture {
        let picture = read_upload(path)?;
        ctx.client.upload_profile_picture(picture).await?;
        print_success("Profile picture updated");
    }
    Ok(())
}

/// Keeps the stored user's username in step with a rename.
fn remember_username(ctx: &Context, updated: &Value) -> Result<()> {
    let Some(username) = extract::username(updated) else {
        return Ok(());
    };
    let mut session = ctx.session.clone();
    let Some(user) = session.user.as_mut().and_then(Value::as_object_mut) else {
        return Ok(());
    };
    if user.get("username").and_then(Value::as_str) == Some(username.as_str()) {
        return Ok(());
    }
    user.insert("username".into(), Value::String(username));
    ctx.store.save(&session).context("Failed to update stored session")?;
    Ok(())
}
