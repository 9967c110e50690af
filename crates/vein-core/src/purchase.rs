//! Budget-constrained level purchasing.
//!
//! Costs are non-decreasing in the level, so taking the contiguous prefix of
//! next levels while it stays affordable buys the largest possible number of
//! levels for the budget: any selection that skips a cheaper level for a
//! farther one pays at least as much per level.

use std::fmt;

use contracts::{CurrencyKind, EffectId, UpgradeReceipt};

use crate::catalog::EffectCatalog;
use crate::player::PlayerState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    UnknownEffect(EffectId),
    LevelCapReached { level: u32, max_level: u32 },
    InsufficientFunds {
        currency: CurrencyKind,
        next_cost: u64,
        available: u64,
    },
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseError::UnknownEffect(effect) => write!(f, "unknown effect {effect}"),
            PurchaseError::LevelCapReached { level, max_level } => {
                write!(f, "level cap reached: {level}/{max_level}")
            }
            PurchaseError::InsufficientFunds {
                currency,
                next_cost,
                available,
            } => write!(
                f,
                "insufficient {currency:?}: next level costs {next_cost}, available {available}"
            ),
        }
    }
}

/// Buy up to `requested_levels` levels of `effect`, cheapest-first, spending
/// at most the agent's current balance of the effect's currency.
pub fn purchase(
    catalog: &EffectCatalog,
    player: &mut PlayerState,
    effect: EffectId,
    requested_levels: u32,
) -> Result<UpgradeReceipt, PurchaseError> {
    let def = catalog
        .get(effect)
        .ok_or(PurchaseError::UnknownEffect(effect))?;
    let current = player.level(effect);
    let headroom = def.max_level.saturating_sub(current);
    let target = requested_levels.min(headroom);
    if target == 0 {
        return Err(PurchaseError::LevelCapReached {
            level: current,
            max_level: def.max_level,
        });
    }

    let available = player.wallet.balance(def.purchase_currency);
    let mut cumulative = 0_u64;
    let mut bought = 0_u32;
    for step in 1..=target {
        let cost = def.cost.cost(current + step);
        let Some(total) = cumulative.checked_add(cost) else {
            break;
        };
        if total > available {
            break;
        }
        cumulative = total;
        bought = step;
    }

    if bought == 0 {
        return Err(PurchaseError::InsufficientFunds {
            currency: def.purchase_currency,
            next_cost: def.cost.cost(current + 1),
            available,
        });
    }

    player
        .wallet
        .debit(def.purchase_currency, cumulative)
        .map_err(|_| PurchaseError::InsufficientFunds {
            currency: def.purchase_currency,
            next_cost: def.cost.cost(current + 1),
            available,
        })?;
    let new_level = current + bought;
    player.set_level(effect, new_level);

    Ok(UpgradeReceipt {
        effect,
        currency: def.purchase_currency,
        requested_levels,
        levels_bought: bought,
        spent: cumulative,
        new_level,
    })
}
