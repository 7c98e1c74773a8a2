/// SurebetsFinder — Bet Importer
///
/// Slučuje nově naparsované bety do úložiště. Create vs. update se rozhoduje
/// podle natural key + kancelář, takže opakovaný import stejného payloadu
/// nevytvoří duplicity.

use anyhow::{Context, Result};
use bet_finder::finder_for;
use bet_model::{Bet, BetLookup, BetStore, Category, Provider, RawContentSource, StoreError};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub created: usize,
    pub updated: usize,
}

impl ImportResult {
    pub fn merge(&mut self, other: ImportResult) {
        self.created += other.created;
        self.updated += other.updated;
    }

    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

pub struct BetImporter<'a, S: BetStore> {
    store: &'a mut S,
}

impl<'a, S: BetStore> BetImporter<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Upsert podle `BetLookup`; NotFound = vytvořit, jiná chyba úložiště končí volání
    pub fn reconcile(&mut self, bets: Vec<Bet>) -> Result<ImportResult, StoreError> {
        let mut result = ImportResult::default();

        for bet in bets {
            let lookup = BetLookup::for_bet(&bet);
            match self.store.find_one(&lookup) {
                Ok(mut existing) => {
                    debug!("{} already exists, updating values", lookup);
                    existing.odds_1 = bet.odds_1;
                    existing.odds_2 = bet.odds_2;
                    existing.url = bet.url;
                    existing.updated_at = Utc::now();
                    self.store.save(&existing)?;
                    result.updated += 1;
                }
                Err(StoreError::NotFound(_)) => {
                    debug!(provider = %bet.provider, "creating new bet");
                    self.store.create(&bet)?;
                    result.created += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    /// Jeden payload: normalizace + reconcile
    pub fn import_payload(
        &mut self,
        provider: Provider,
        category: Category,
        content: &str,
    ) -> Result<ImportResult> {
        let bets = finder_for(provider)
            .find_bets(content, category)
            .with_context(|| format!("{provider} payload could not be normalized"))?;
        let found = bets.len();

        let result = self.reconcile(bets)?;
        info!(
            provider = %provider,
            found,
            created = result.created,
            updated = result.updated,
            "payload imported"
        );
        Ok(result)
    }

    /// Projde všechny nezpracované raw contenty. Payload, který nejde přečíst,
    /// zůstane nezpracovaný; chyba úložiště import ukončí.
    pub fn import_all<R: RawContentSource>(&mut self, source: &mut R) -> Result<ImportResult> {
        info!("Bets importer has started");

        let mut total = ImportResult::default();
        let pending = source
            .get_all_unprocessed()
            .context("loading unprocessed raw contents")?;

        for raw in pending {
            let bets = match finder_for(raw.provider).find_bets(&raw.content, raw.category) {
                Ok(bets) => bets,
                Err(e) => {
                    warn!(raw_content_id = %raw.id, provider = %raw.provider, "raw content skipped: {}", e);
                    continue;
                }
            };
            let found = bets.len();

            let result = self.reconcile(bets)?;
            source
                .mark_processed(raw.id)
                .with_context(|| format!("marking raw content {} as processed", raw.id))?;

            info!(
                raw_content_id = %raw.id,
                provider = %raw.provider,
                found,
                created = result.created,
                updated = result.updated,
                "raw content imported"
            );
            total.merge(result);
        }

        info!(created = total.created, updated = total.updated, "Bets importer finished");
        Ok(total)
    }
}
