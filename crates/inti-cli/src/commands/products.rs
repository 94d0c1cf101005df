use anyhow::Result;
use colored::Colorize;
use inti_client::forms::NewProduct;
use inti_client::models::ProductSummary;
use inti_client::{Collection, auth};

use crate::cli::{CreateProductArgs, DeleteArgs, ProductsCommands};
use crate::commands::{created_id, profile, read_upload};
use crate::context::Context;
use crate::output::{describe_unavailable, print_notice, print_products, print_success, print_value};

pub async fn run(ctx: &Context, command: &ProductsCommands) -> Result<()> {
    match command {
        ProductsCommands::List(args) => list(ctx, args.username.as_deref()).await,
        ProductsCommands::Create(args) => create(ctx, args).await,
        ProductsCommands::Show(args) => {
            let product = ctx.client.product_detail(&args.id).await?;
            print_value(&product, ctx.format);
            Ok(())
        }
        ProductsCommands::Delete(args) => delete(ctx, args).await,
    }
}

async fn list(ctx: &Context, username: Option<&str>) -> Result<()> {
    let view = profile::open(ctx, username)?;
    view.load_profile().await?;

    let products = view.products().await?;
    if let Collection::Embedded(_) = products {
        print_notice("Showing products embedded in the profile");
    }
    match products {
        Collection::Loaded(items) | Collection::Embedded(items) => {
            let summaries: Vec<_> = items
                .iter()
                .map(|p| ProductSummary::from_record(p, ctx.base_url()))
                .collect();
            print_products(&summaries, ctx.format);
        }
        Collection::Unavailable(reason) => print_notice(&describe_unavailable(&reason)),
    }
    Ok(())
}

async fn create(ctx: &Context, args: &CreateProductArgs) -> Result<()> {
    ctx.require_login()?;
    let product = NewProduct {
        title: args.title.clone(),
        description: args.description.clone(),
        price: args.price.clone(),
        image: args.image.as_deref().map(read_upload).transpose()?,
    };
    let created = ctx.client.create_product(product).await?;
    match created_id(&created) {
        Some(id) => print_success(&format!("Created product {}", id.cyan())),
        None => print_success(&format!("Created product {}", args.title.cyan())),
    }
    Ok(())
}

async fn delete(ctx: &Context, args: &DeleteArgs) -> Result<()> {
    ctx.require_login()?;
    if !args.force {
        let product = ctx.client.product_detail(&args.id).await?;
        let me = auth::resolve_self(&ctx.client, &ctx.session).await?;
        if !auth::is_owner(&product, &me) {
            anyhow::bail!("Product {} does not belong to you (use --force to try anyway)", args.id);
        }
    }
    ctx.client.delete_product(&args.id).await?;
    print_success(&format!("Deleted product {}", args.id.cyan()));
    Ok(())
}
