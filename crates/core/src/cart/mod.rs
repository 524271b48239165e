pub mod ledger;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::cart::{CartOption, CartPlan};
use crate::domain::money::round_money;
use crate::domain::quote::{ProviderId, Quote};

pub use ledger::CartLedger;

/// Turns a flat quote set into single-provider carts plus one mixed cart.
#[derive(Clone, Debug, Default)]
pub struct CartBuilder;

impl CartBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_cart(&self, quotes: &[Quote]) -> CartPlan {
        let mut options = single_provider_options(quotes);
        if let Some(mixed) = mixed_option(quotes) {
            options.push(mixed);
        }
        let best_option_index = select_best(&options);

        debug!(
            event_name = "cart.plan_built",
            quotes = quotes.len(),
            options = options.len(),
            best_option_index,
            "built cart plan"
        );

        CartPlan { options, best_option_index }
    }
}

fn group_by_provider(quotes: &[&Quote]) -> Vec<(ProviderId, Vec<Quote>)> {
    let mut groups: Vec<(ProviderId, Vec<Quote>)> = Vec::new();
    for quote in quotes {
        match groups.iter_mut().find(|(provider, _)| provider == &quote.provider) {
            Some((_, group)) => group.push((*quote).clone()),
            None => groups.push((quote.provider.clone(), vec![(*quote).clone()])),
        }
    }
    groups
}

fn single_provider_options(quotes: &[Quote]) -> Vec<CartOption> {
    let refs: Vec<&Quote> = quotes.iter().collect();
    group_by_provider(&refs)
        .into_iter()
        .map(|(provider, quotes)| {
            let subtotal: Decimal = quotes.iter().map(|quote| quote.unit_price).sum();
            let delivery_fee =
                quotes.iter().map(|quote| quote.delivery_fee).max().unwrap_or(Decimal::ZERO);
            let eta_minutes = quotes.iter().map(|quote| quote.eta_minutes).max().unwrap_or(0);
            CartOption {
                provider,
                quotes,
                subtotal: round_money(subtotal),
                delivery_fee,
                total: round_money(subtotal + delivery_fee),
                eta_minutes,
            }
        })
        .collect()
}

/// Cheapest quote per item; an earlier quote keeps its slot on a price tie.
fn mixed_option(quotes: &[Quote]) -> Option<CartOption> {
    let mut cheapest: Vec<&Quote> = Vec::new();
    for quote in quotes {
        match cheapest.iter_mut().find(|current| current.item_name == quote.item_name) {
            Some(current) if quote.unit_price < current.unit_price => *current = quote,
            Some(_) => {}
            None => cheapest.push(quote),
        }
    }
    if cheapest.is_empty() {
        return None;
    }

    let subtotal: Decimal = cheapest.iter().map(|quote| quote.unit_price).sum();
    let delivery_fee: Decimal = group_by_provider(&cheapest)
        .iter()
        .map(|(provider, _)| {
            quotes
                .iter()
                .find(|quote| &quote.provider == provider)
                .map(|quote| quote.delivery_fee)
                .unwrap_or(Decimal::ZERO)
        })
        .sum();
    let eta_minutes = cheapest.iter().map(|quote| quote.eta_minutes).max().unwrap_or(0);

    Some(CartOption {
        provider: ProviderId::mixed(),
        quotes: cheapest.into_iter().cloned().collect(),
        subtotal: round_money(subtotal),
        delivery_fee: round_money(delivery_fee),
        total: round_money(subtotal + delivery_fee),
        eta_minutes,
    })
}

/// Lowest total wins; equal totals go to the strictly faster option.
fn select_best(options: &[CartOption]) -> usize {
    let mut best = 0;
    for (index, option) in options.iter().enumerate().skip(1) {
        let current = &options[best];
        if option.total < current.total
            || (option.total == current.total && option.eta_minutes < current.eta_minutes)
        {
            best = index;
        }
    }
    best
}
