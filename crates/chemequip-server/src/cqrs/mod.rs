//! In-process request dispatch
//!
//! HTTP handlers call the feature `handle` functions directly. The mediator
//! exposes the same handlers to non-HTTP callers, one registration per
//! command or query.

pub use mediator::DefaultAsyncMediator;

use crate::features::FeatureState;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(state: FeatureState) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Users
        .add_handler({
            let state = state.clone();
            move |cmd| {
                let state = state.clone();
                async move { crate::features::users::commands::register::handle(state.db, state.auth, cmd).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |cmd| {
                let state = state.clone();
                async move { crate::features::users::commands::login::handle(state.db, state.auth, cmd).await }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::users::commands::logout::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::users::queries::me::handle(pool, query).await }
            }
        })
        // Datasets
        .add_handler({
            let state = state.clone();
            move |cmd| {
                let state = state.clone();
                async move {
                    crate::features::datasets::commands::upload::handle(
                        state.db,
                        state.ingest,
                        state.locks,
                        cmd,
                    )
                    .await
                }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::datasets::queries::list::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::datasets::queries::get::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::datasets::queries::equipment::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::datasets::queries::summary::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::datasets::queries::report::handle(pool, query).await }
            }
        })
        // Equipment
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::equipment::queries::list::handle(pool, query).await }
            }
        })
        // Summary
        .add_handler({
            let pool = state.db.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::summary::queries::global::handle(pool, query).await }
            }
        })
        .build()
}
