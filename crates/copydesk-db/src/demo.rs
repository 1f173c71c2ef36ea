// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Store;
use anyhow::{Context, Result};
use crate::faker::{NewsroomFaker, editors};
use tracing::info;

pub const DEMO_SEED: u64 = 20_260_601;
pub const DEMO_ARTICLE_COUNT: usize = 40;

impl Store {
    /// Fills an empty store with generated newsroom content. Returns the number
    /// of articles created. A store that already holds articles is left alone.
    pub fn seed_demo_data(&self) -> Result<usize> {
        let existing: i64 = self
            .raw_connection()
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
            .context("count existing articles")?;
        if existing > 0 {
            return Ok(0);
        }

        for editor in editors() {
            self.upsert_profile(editor)?;
        }

        let mut faker = NewsroomFaker::new(DEMO_SEED);
        for _ in 0..DEMO_ARTICLE_COUNT {
            let article = faker.article();
            let id = self.create_article(&article)?;
            for _ in 0..faker.int_n(3) {
                let comment = faker.comment();
                self.add_comment(id, &comment.author, &comment.body)?;
            }
        }

        info!(count = DEMO_ARTICLE_COUNT, "seeded demo articles");
        Ok(DEMO_ARTICLE_COUNT)
    }
}
