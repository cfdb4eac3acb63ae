mod elevation_cache;
mod http;
mod options;
mod routedir;
mod web;

use anyhow::Error as AnyError;
use clap::Parser;
use elevation_cache::ElevationCache;
use http::Http;
use log::{info, warn};
use options::{Cli, Command as CliCmd};
use panochain::{
    stitch_steps, CancelToken, Flythrough, JsonChainStore, Route, WalkOutcome, Walker,
};
use routedir::{RouteDir, Source};
use std::{process, thread, time::Duration};
use web::WebInfo;

fn main() -> Result<(), AnyError> {
    let Cli {
        dir,
        debug,
        api_key,
        directions_url,
        pano_url,
        elevation_url,
        timeout,
        cmd,
    } = Cli::parse();

    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let http = Http::new(
        api_key,
        directions_url,
        pano_url,
        elevation_url,
        Duration::from_secs(timeout),
    )?;
    let dir = RouteDir::new(dir);
    let source = dir.source()?;
    let (vertices, route) = load_route(&dir, &http, &source)?;

    match cmd {
        CliCmd::Route => {
            println!(
                "{} vertices, {} route points",
                vertices.len(),
                route.len()
            );
        }
        CliCmd::Walk => {
            walk(&dir, &http, &source, &route)?;
        }
        CliCmd::Flythrough => flythrough(&dir, &http, &source, &vertices, &route)?,
        CliCmd::All => {
            if walk(&dir, &http, &source, &route)? == WalkOutcome::Completed {
                flythrough(&dir, &http, &source, &vertices, &route)?;
            }
        }
    };
    Ok(())
}

fn load_route(
    dir: &RouteDir,
    http: &Http,
    source: &Source,
) -> Result<(Vec<(f64, f64)>, Route), AnyError> {
    let response = dir.directions(|| http.directions(&source.route_request))?;
    let steps = http::step_polylines(response)?;
    let vertices = stitch_steps(&steps)?;
    let route = Route::densify(&vertices, source.config.walk.spacing_m)?;
    info!(
        "{} route vertices densified into {} points",
        vertices.len(),
        route.len()
    );
    Ok((vertices, route))
}

/// Cancels `token` on the first Ctrl-C, so the walk stops once the
/// panorama being fetched is appended. A second Ctrl-C exits at once.
fn cancel_on_interrupt(token: CancelToken) -> Result<(), AnyError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::spawn(move || {
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("interrupted, stopping after the current panorama");
            token.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                process::exit(130);
            }
        });
    });
    Ok(())
}

fn walk(
    dir: &RouteDir,
    http: &Http,
    source: &Source,
    route: &Route,
) -> Result<WalkOutcome, AnyError> {
    let mut walker = Walker::builder()
        .route(route)
        .source(http)
        .store(JsonChainStore::new(dir.path("panos.json")))
        .rules(source.rules.clone())
        .config(source.config.walk.clone())
        .build()?;
    cancel_on_interrupt(walker.cancel_token())?;
    let (traversal, outcome) = walker.run()?;
    let chain = traversal.chain();
    match outcome {
        WalkOutcome::Completed => println!(
            "{} panoramas, {} after exclusions",
            chain.len(),
            chain.filtered(&source.rules).len()
        ),
        WalkOutcome::Paused => println!("paused with {} panoramas", chain.len()),
    }
    Ok(outcome)
}

fn flythrough(
    dir: &RouteDir,
    http: &Http,
    source: &Source,
    vertices: &[(f64, f64)],
    route: &Route,
) -> Result<(), AnyError> {
    let walker = Walker::builder()
        .route(route)
        .source(http)
        .store(JsonChainStore::new(dir.path("panos.json")))
        .config(source.config.walk.clone())
        .build()?;
    let panoramas = walker.load()?.chain().filtered(&source.rules);

    let elevations = ElevationCache::load(http, dir.path("elevations.json"))?;
    let flythrough = Flythrough::build(&panoramas, route, &elevations, &source.config)?;

    routedir::write_json(&dir.path("flythrough.json"), &flythrough)?;
    let web_info = WebInfo::new(source.title.clone(), vertices, &flythrough);
    routedir::write_json(&dir.path("web_info.json"), &web_info)?;

    let summary = flythrough.summary;
    println!(
        "{} frames, {} gap points, {:.0}m, {:.1}s",
        summary.frames, summary.gaps, summary.distance_m, summary.duration_s
    );
    Ok(())
}
