//! Automatic buy-to-maximum driver.
//!
//! Runs on a fixed cadence. Entitlement lookups go to an external provider
//! and are cached with a short TTL; cache entries can be invalidated on
//! demand when an entitlement is known to have changed. A per-agent,
//! per-effect rate limit keeps trickling balances from producing pathological
//! strings of one-level purchases.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use contracts::{EffectId, SimConfig, UpgradeReceipt};

use crate::catalog::EffectCatalog;
use crate::player::PlayerState;
use crate::purchase::purchase;

// ---------------------------------------------------------------------------
// Entitlement seam
// ---------------------------------------------------------------------------

/// External check for whether an agent may use automatic upgrading at all.
pub trait EntitlementProvider: fmt::Debug {
    fn has_auto_upgrade_entitlement(&self, agent_id: &str) -> bool;
}

/// Map-backed provider for tests and the demo world.
#[derive(Debug, Clone, Default)]
pub struct StaticEntitlements {
    entitled: BTreeSet<String>,
}

impl StaticEntitlements {
    pub fn grant(&mut self, agent_id: impl Into<String>) {
        self.entitled.insert(agent_id.into());
    }

    pub fn revoke(&mut self, agent_id: &str) {
        self.entitled.remove(agent_id);
    }
}

impl EntitlementProvider for StaticEntitlements {
    fn has_auto_upgrade_entitlement(&self, agent_id: &str) -> bool {
        self.entitled.contains(agent_id)
    }
}

// ---------------------------------------------------------------------------
// Entitlement cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct EntitlementCache {
    entries: BTreeMap<String, (bool, u64)>,
}

impl EntitlementCache {
    fn check(
        &mut self,
        agent_id: &str,
        now: u64,
        ttl_ticks: u64,
        provider: &dyn EntitlementProvider,
    ) -> bool {
        if let Some((cached, checked_at)) = self.entries.get(agent_id) {
            if now.saturating_sub(*checked_at) < ttl_ticks {
                return *cached;
            }
        }
        let fresh = provider.has_auto_upgrade_entitlement(agent_id);
        self.entries.insert(agent_id.to_string(), (fresh, now));
        fresh
    }

    fn invalidate(&mut self, agent_id: &str) {
        self.entries.remove(agent_id);
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AutoUpgradeScheduler {
    period_ticks: u64,
    min_interval_ticks: u64,
    entitlement_ttl_ticks: u64,
    cache: EntitlementCache,
    last_success: BTreeMap<(String, EffectId), u64>,
}

impl AutoUpgradeScheduler {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            period_ticks: config.autobuy_period_ticks.max(1),
            min_interval_ticks: config.autobuy_min_interval_ticks,
            entitlement_ttl_ticks: config.entitlement_ttl_ticks,
            cache: EntitlementCache::default(),
            last_success: BTreeMap::new(),
        }
    }

    pub fn due(&self, tick: u64) -> bool {
        tick % self.period_ticks == 0
    }

    /// Run one cycle for one agent: for every opted-in effect, attempt to
    /// buy the full remaining headroom and let the purchaser's budget bound
    /// the result. Purchase failures are absorbed; only successes are
    /// reported and rate-limited.
    pub fn attempt_for_agent(
        &mut self,
        catalog: &EffectCatalog,
        player: &mut PlayerState,
        provider: &dyn EntitlementProvider,
        tick: u64,
    ) -> Vec<UpgradeReceipt> {
        if !self
            .cache
            .check(&player.agent_id, tick, self.entitlement_ttl_ticks, provider)
        {
            return Vec::new();
        }

        let mut receipts = Vec::new();
        for effect in player.auto_upgrade_effects() {
            let key = (player.agent_id.clone(), effect);
            if let Some(last) = self.last_success.get(&key) {
                if tick.saturating_sub(*last) < self.min_interval_ticks {
                    continue;
                }
            }
            let Some(def) = catalog.get(effect) else {
                continue;
            };
            let headroom = def.max_level.saturating_sub(player.level(effect));
            if headroom == 0 {
                continue;
            }
            if let Ok(receipt) = purchase(catalog, player, effect, headroom) {
                self.last_success.insert(key, tick);
                receipts.push(receipt);
            }
        }
        receipts
    }

    /// Drop an agent's cache and rate-limit bookkeeping on eviction.
    pub fn forget_agent(&mut self, agent_id: &str) {
        self.cache.invalidate(agent_id);
        self.last_success.retain(|(owner, _), _| owner != agent_id);
    }

    /// Force a fresh entitlement lookup on the next cycle.
    pub fn invalidate_entitlement(&mut self, agent_id: &str) {
        self.cache.invalidate(agent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CurrencyKind;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: Cell<u32>,
        entitled: bool,
    }

    impl EntitlementProvider for CountingProvider {
        fn has_auto_upgrade_entitlement(&self, _agent_id: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.entitled
        }
    }

    fn rigged_player(coins: u64) -> PlayerState {
        let mut player = PlayerState::new("miner_001", &SimConfig::default(), 0);
        player.wallet.credit(CurrencyKind::Coins, coins);
        player.set_auto_upgrade(EffectId::Combustion, true);
        player
    }

    #[test]
    fn unentitled_agents_buy_nothing() {
        let catalog = EffectCatalog::default_catalog();
        let mut scheduler = AutoUpgradeScheduler::new(&SimConfig::default());
        let provider = CountingProvider {
            entitled: false,
            ..CountingProvider::default()
        };
        let mut player = rigged_player(1_000_000);
        let receipts = scheduler.attempt_for_agent(&catalog, &mut player, &provider, 0);
        assert!(receipts.is_empty());
        assert_eq!(player.level(EffectId::Combustion), 0);
    }

    #[test]
    fn entitlement_checks_are_cached_within_the_ttl() {
        let catalog = EffectCatalog::default_catalog();
        let config = SimConfig::default();
        let ttl = config.entitlement_ttl_ticks;
        let mut scheduler = AutoUpgradeScheduler::new(&config);
        let provider = CountingProvider {
            entitled: true,
            ..CountingProvider::default()
        };
        let mut player = rigged_player(0);

        scheduler.attempt_for_agent(&catalog, &mut player, &provider, 0);
        scheduler.attempt_for_agent(&catalog, &mut player, &provider, 1);
        scheduler.attempt_for_agent(&catalog, &mut player, &provider, ttl - 1);
        assert_eq!(provider.calls.get(), 1);

        scheduler.attempt_for_agent(&catalog, &mut player, &provider, ttl);
        assert_eq!(provider.calls.get(), 2);
    }

    #[test]
    fn invalidation_forces_a_fresh_lookup() {
        let catalog = EffectCatalog::default_catalog();
        let mut scheduler = AutoUpgradeScheduler::new(&SimConfig::default());
        let provider = CountingProvider {
            entitled: true,
            ..CountingProvider::default()
        };
        let mut player = rigged_player(0);

        scheduler.attempt_for_agent(&catalog, &mut player, &provider, 0);
        scheduler.invalidate_entitlement("miner_001");
        scheduler.attempt_for_agent(&catalog, &mut player, &provider, 1);
        assert_eq!(provider.calls.get(), 2);
    }

    #[test]
    fn successful_batches_are_rate_limited_per_effect() {
        let catalog = EffectCatalog::default_catalog();
        let config = SimConfig::default();
        let min_interval = config.autobuy_min_interval_ticks;
        let mut scheduler = AutoUpgradeScheduler::new(&config);
        let provider = CountingProvider {
            entitled: true,
            ..CountingProvider::default()
        };
        // Enough for one combustion level at a time.
        let mut player = rigged_player(300);

        let first = scheduler.attempt_for_agent(&catalog, &mut player, &provider, 0);
        assert_eq!(first.len(), 1);
        assert_eq!(player.level(EffectId::Combustion), 1);

        // Balance trickles back in, but the rate limit holds the next batch.
        player.wallet.credit(CurrencyKind::Coins, 300);
        let second = scheduler.attempt_for_agent(&catalog, &mut player, &provider, 1);
        assert!(second.is_empty());

        let third =
            scheduler.attempt_for_agent(&catalog, &mut player, &provider, min_interval);
        assert_eq!(third.len(), 1);
        assert_eq!(player.level(EffectId::Combustion), 2);
    }

    #[test]
    fn failed_purchases_do_not_consume_the_rate_limit() {
        let catalog = EffectCatalog::default_catalog();
        let mut scheduler = AutoUpgradeScheduler::new(&SimConfig::default());
        let provider = CountingProvider {
            entitled: true,
            ..CountingProvider::default()
        };
        let mut player = rigged_player(0);

        assert!(scheduler
            .attempt_for_agent(&catalog, &mut player, &provider, 0)
            .is_empty());
        // Funds arrive one tick later; no rate limit applies because nothing
        // succeeded yet.
        player.wallet.credit(CurrencyKind::Coins, 300);
        let receipts = scheduler.attempt_for_agent(&catalog, &mut player, &provider, 1);
        assert_eq!(receipts.len(), 1);
    }

    #[test]
    fn buys_headroom_up_to_budget_in_one_batch() {
        let catalog = EffectCatalog::default_catalog();
        let mut scheduler = AutoUpgradeScheduler::new(&SimConfig::default());
        let provider = CountingProvider {
            entitled: true,
            ..CountingProvider::default()
        };
        // Combustion costs 150 + 75*l: levels 1..=3 cost 225+300+375 = 900.
        let mut player = rigged_player(1_000);
        let receipts = scheduler.attempt_for_agent(&catalog, &mut player, &provider, 0);
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].levels_bought, 3);
        assert_eq!(receipts[0].spent, 900);
        assert_eq!(player.wallet.balance(CurrencyKind::Coins), 100);
    }
}
