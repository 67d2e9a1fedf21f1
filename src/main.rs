//! Quire - a static site generator for hand-written HTML pages.

mod assets;
mod build;
mod cli;
mod config;
mod init;
mod link;
mod logger;
mod page;
mod render;
mod serve;
mod sitemap;
mod watch;

use anyhow::Result;
use build::{BuildOptions, build_site};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::{clean, init_site, new_pages};
use page::{FilePageResolver, PageResolver};
use serve::serve_site;
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(SiteConfig::load(cli)?));
    let resolver: &'static dyn PageResolver = Box::leak(Box::new(FilePageResolver::new(config)));

    match &cli.command {
        Commands::Build { files } => {
            let options = BuildOptions {
                files,
                generate_sitemap: cli.generate_sitemap,
                dev_mode: false,
            };
            build_site(config, resolver, &options)
        }
        Commands::Dev { .. } => {
            let options = BuildOptions {
                dev_mode: true,
                ..BuildOptions::default()
            };
            build_site(config, resolver, &options)?;
            serve_site(config, resolver)
        }
        Commands::New { file, more } => {
            let files: Vec<PathBuf> = std::iter::once(file).chain(more).cloned().collect();
            new_pages(&files, config, resolver)
        }
        Commands::Clean => clean(config),
        Commands::GenSitemap => sitemap::regenerate(config, resolver).map(|_| ()),
        Commands::Init => init_site(config),
    }
}
