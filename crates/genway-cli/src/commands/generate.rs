//! `genway generate`

use crate::args::GenerateArgs;
use anyhow::{Context, bail};
use futures::StreamExt;
use genway_core::{
    CallerContext, Gateway, GatewayConfig, GenerateParams, Identity, PlanTier, StreamEvent,
};
use std::io::Write;
use tokio_util::sync::CancellationToken;

pub async fn run(config: GatewayConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let gateway = Gateway::from_config(&config)?;
    let plan: PlanTier = args.plan.parse()?;
    let caller = CallerContext::new(Identity::account(&args.account), plan);

    let mut params =
        GenerateParams::new(args.prompt.unwrap_or_default(), args.kind).with_tier(args.tier);
    if let (Some(path), Some(instruction)) = (&args.prior_output_file, args.refine) {
        let prior = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading prior output from {}", path.display()))?;
        params = params.with_refinement(prior, instruction);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if args.stream {
        stream(&gateway, &caller, params.with_stream(true), cancel).await
    } else {
        let result = gateway.generate(&caller, params, &cancel).await?;
        println!("{}", result.content);
        eprintln!("model: {} ({} ms)", result.model_used, result.duration_ms);
        print_hints(&result.hints);
        Ok(())
    }
}

async fn stream(
    gateway: &Gateway,
    caller: &CallerContext,
    params: GenerateParams,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut events = gateway.generate_stream(caller, params, cancel)?;
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Meta { model } => eprintln!("model: {}", model),
            StreamEvent::Token(token) => {
                stdout.write_all(token.as_bytes())?;
                stdout.flush()?;
            }
            StreamEvent::Hints(hints) => {
                writeln!(stdout)?;
                print_hints(&hints);
            }
            StreamEvent::Error { message, code } => {
                writeln!(stdout)?;
                bail!("{} ({})", message, code);
            }
            StreamEvent::Done => break,
        }
    }
    writeln!(stdout)?;
    Ok(())
}

fn print_hints(hints: &[String]) {
    for hint in hints {
        eprintln!("hint: {}", hint);
    }
}
