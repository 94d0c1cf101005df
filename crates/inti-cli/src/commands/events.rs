use anyhow::Result;
use colored::Colorize;
use inti_client::models::{EventSummary, ProfileSummary, infer_attendance};
use inti_client::{Collection, auth, normalize};
use serde_json::Value;

use crate::cli::EventsCommands;
use crate::commands::profile;
use crate::context::Context;
use crate::output::{
    describe_unavailable, print_events, print_notice, print_profiles, print_success, print_value,
};

pub async fn run(ctx: &Context, command: &EventsCommands) -> Result<()> {
    match command {
        EventsCommands::List => {
            let events = normalize::into_collection(ctx.client.events().await?);
            print_with_attendance(ctx, &events).await
        }
        EventsCommands::Mine => {
            ctx.require_login()?;
            let events = normalize::into_collection(ctx.client.my_events().await?);
            print_events(&summaries(ctx, &events), None, ctx.format);
            Ok(())
        }
        EventsCommands::Org(args) => organization(ctx, args.username.as_deref()).await,
        EventsCommands::Show(args) => {
            let event = ctx.client.event_detail(&args.id).await?;
            print_value(&event, ctx.format);
            Ok(())
        }
        EventsCommands::Attend(args) => {
            ctx.require_login()?;
            ctx.client.attend_event(&args.id).await?;
            print_success(&format!("Attendance confirmed for event {}", args.id.cyan()));
            Ok(())
        }
        EventsCommands::Leave(args) => {
            ctx.require_login()?;
            ctx.client.cancel_attendance(&args.id).await?;
            print_success(&format!("Attendance cancelled for event {}", args.id.cyan()));
            Ok(())
        }
        EventsCommands::Attendees(args) => {
            ctx.require_login()?;
            let attendees = normalize::into_collection(ctx.client.event_attendees(&args.id).await?);
            let profiles: Vec<_> = attendees
                .iter()
                .map(|p| ProfileSummary::from_record(p, ctx.base_url()))
                .collect();
            print_profiles(&profiles, ctx.format);
            Ok(())
        }
    }
}

fn summaries(ctx: &Context, events: &[Value]) -> Vec<EventSummary> {
    events
        .iter()
        .map(|e| EventSummary::from_record(e, ctx.base_url()))
        .collect()
}

/// Adds the attendance column when the own profile id is known.
async fn print_with_attendance(ctx: &Context, events: &[Value]) -> Result<()> {
    let me = if ctx.session.is_authenticated() {
        auth::resolve_self(&ctx.client, &ctx.session).await?.id
    } else {
        None
    };
    let going = ctx
        .session
        .is_authenticated()
        .then(|| {
            events
                .iter()
                .map(|e| infer_attendance(e, me.as_ref()))
                .collect::<Vec<_>>()
        });
    print_events(&summaries(ctx, events), going.as_deref(), ctx.format);
    Ok(())
}

async fn organization(ctx: &Context, username: Option<&str>) -> Result<()> {
    let view = profile::open(ctx, username)?;
    view.load_profile().await?;

    match view.organization_events().await? {
        Collection::Loaded(items) => print_events(&summaries(ctx, &items), None, ctx.format),
        Collection::Embedded(items) => {
            print_notice("Showing events embedded in the profile");
            print_events(&summaries(ctx, &items), None, ctx.format);
        }
        Collection::Unavailable(reason) => print_notice(&describe_unavailable(&reason)),
    }
    Ok(())
}
