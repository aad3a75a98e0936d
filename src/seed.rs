//! Seed content for an empty store
//!
//! Creates `/<container>/n000 .. n<count-1>`, each carrying a random colour
//! on the indexed property. Seeding goes through a normal session commit,
//! so the index and storage see it like any other change.

use crate::error::StoreResult;
use crate::repository::Repository;
use crate::tree::NodePath;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

/// Colours handed out to seeded nodes
pub const COLOURS: &[&str] = &["red", "green", "blue"];

/// Seed with the thread RNG; returns the number of nodes created
pub fn seed(repo: &Repository) -> StoreResult<usize> {
    seed_with(repo, &mut rand::thread_rng())
}

/// Seed with a caller-supplied RNG
pub fn seed_with<R: Rng + ?Sized>(repo: &Repository, rng: &mut R) -> StoreResult<usize> {
    let config = &repo.config().seed;
    if !config.enabled {
        debug!("Seeding disabled");
        return Ok(0);
    }

    let container = NodePath::parse(&config.container)?;
    if repo.snapshot().tree().resolve(&container).is_ok() {
        debug!("{} already present, nothing to seed", container);
        return Ok(0);
    }

    let property = repo.config().indexed_property.clone();
    let mut session = repo.login_admin()?;
    let result = (|| {
        session.add_node(&container.to_string(), &config.primary_type)?;
        for i in 0..config.count {
            let child = container.child(&format!("n{:03}", i))?.to_string();
            session.add_node(&child, &config.primary_type)?;
            if let Some(colour) = COLOURS.choose(rng) {
                session.set_property(&child, &property, (*colour).into())?;
            }
        }
        session.commit()
    })();
    session.logout()?;

    let revision = result?;
    info!("Seeded {} nodes under {} at revision {}", config.count, container, revision);
    Ok(config.count)
}
