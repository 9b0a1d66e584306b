use crate::ledger::Month;
use crate::portfolio::metrics::{
    calculate_trade_metrics, close_month, derive_status, open_heat_contribution,
    realized_pl_by_close_month,
};
use crate::trades::{Trade, TradeLot, TradeMetrics, TradeSide, TradeStatus};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn lot(price: Decimal, quantity: Decimal, lot_date: Option<NaiveDate>) -> Option<TradeLot> {
    Some(TradeLot {
        price,
        quantity,
        date: lot_date,
    })
}

fn buy_trade(entry_price: Decimal, initial_qty: Decimal) -> Trade {
    Trade {
        id: "t1".to_string(),
        number: "1".to_string(),
        symbol: "ACME".to_string(),
        date: date(2024, 1, 1),
        side: TradeSide::Buy,
        status: TradeStatus::default(),
        entry_price,
        initial_qty,
        pyramid1: None,
        pyramid2: None,
        exit1: None,
        exit2: None,
        exit3: None,
        stop_loss: Decimal::ZERO,
        trailing_stop: Decimal::ZERO,
        target: Decimal::ZERO,
        market_price: Decimal::ZERO,
        metrics: TradeMetrics::default(),
    }
}

fn as_of() -> NaiveDate {
    date(2024, 6, 30)
}

#[test]
fn weighted_entry_average_and_allocation() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.pyramid1 = lot(dec!(110), dec!(10), Some(date(2024, 1, 5)));

    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.avg_entry_price, dec!(105));
    assert_eq!(metrics.position_size, dec!(2100));
    assert_eq!(metrics.allocation_pct, dec!(2.1));
    assert_eq!(metrics.open_qty, dec!(20));
    assert_eq!(metrics.exited_qty, Decimal::ZERO);
}

#[test]
fn zero_portfolio_size_degrades_percentages_to_zero() {
    let trade = buy_trade(dec!(100), dec!(10));
    let metrics = calculate_trade_metrics(&trade, Decimal::ZERO, as_of());
    assert_eq!(metrics.allocation_pct, Decimal::ZERO);
    assert_eq!(metrics.pf_impact_pct, Decimal::ZERO);
}

#[test]
fn stop_loss_distance_percentage() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.stop_loss = dec!(95);
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.stop_loss_pct, dec!(5));

    trade.stop_loss = Decimal::ZERO;
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.stop_loss_pct, Decimal::ZERO);
}

#[test]
fn realized_fields_for_a_closed_trade() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.stop_loss = dec!(95);
    trade.exit1 = lot(dec!(110), dec!(10), Some(date(2024, 1, 11)));

    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.exited_qty, dec!(10));
    assert_eq!(metrics.open_qty, Decimal::ZERO);
    assert_eq!(metrics.avg_exit_price, dec!(110));
    assert_eq!(metrics.realised_amount, dec!(1100));
    assert_eq!(metrics.realized_pl, dec!(100));
    assert_eq!(metrics.pf_impact_pct, dec!(0.1));
    assert_eq!(metrics.holding_days, 10);
    // Risk 5 against reward 10.
    assert_eq!(metrics.reward_risk, dec!(2));
    assert_eq!(metrics.stock_move_pct, dec!(10));
}

#[test]
fn excess_exit_quantity_clamps_open_quantity() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.exit1 = lot(dec!(120), dec!(15), Some(date(2024, 1, 11)));

    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.open_qty, Decimal::ZERO);
    assert_eq!(metrics.exited_qty, dec!(15));
    // Only the 10 matched shares realize anything.
    assert_eq!(metrics.realized_pl, dec!(200));
}

#[test]
fn stock_move_blends_partial_positions_and_negates_for_sell() {
    let mut trade = buy_trade(dec!(100), dec!(20));
    trade.market_price = dec!(110);
    trade.exit1 = lot(dec!(120), dec!(10), Some(date(2024, 2, 1)));

    // Realized move 20% on 10 shares, unrealized 10% on 10 shares.
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.stock_move_pct, dec!(15));

    trade.side = TradeSide::Sell;
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.stock_move_pct, dec!(-15));
}

#[test]
fn stock_move_requires_market_price_while_open() {
    let trade = buy_trade(dec!(100), dec!(10));
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.stock_move_pct, Decimal::ZERO);
}

#[test]
fn reward_risk_prefers_trailing_stop_for_pyramid_lots_only() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.stop_loss = dec!(95);
    trade.trailing_stop = dec!(99);
    trade.target = dec!(110);
    trade.pyramid1 = lot(dec!(104), dec!(10), Some(date(2024, 1, 5)));

    // Initial lot: risk 5, reward 10 => 2. Pyramid: risk |104-99| = 5,
    // reward 6 => 1.2. Quantity-weighted mean: 1.6.
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.reward_risk, dec!(1.6));
}

#[test]
fn reward_risk_falls_back_to_market_price_without_target() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.stop_loss = dec!(95);
    trade.market_price = dec!(105);
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.reward_risk, dec!(1));
}

#[test]
fn reward_risk_degrades_without_a_stop() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.target = dec!(110);
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.reward_risk, Decimal::ZERO);
}

#[test]
fn holding_days_weights_legs_by_quantity() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.pyramid1 = lot(dec!(102), dec!(10), Some(date(2024, 1, 6)));
    trade.exit1 = lot(dec!(110), dec!(20), Some(date(2024, 1, 11)));

    // Oldest leg held 10 days, pyramid leg 5 days; mean 7.5 rounds to 8.
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.holding_days, 8);
}

#[test]
fn holding_days_runs_open_quantity_to_as_of() {
    let trade = buy_trade(dec!(100), dec!(10));
    let metrics = calculate_trade_metrics(&trade, dec!(100000), date(2024, 1, 11));
    assert_eq!(metrics.holding_days, 10);
}

#[test]
fn holding_days_splits_an_exit_across_legs_oldest_first() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.pyramid1 = lot(dec!(102), dec!(10), Some(date(2024, 1, 6)));
    trade.exit1 = lot(dec!(110), dec!(15), Some(date(2024, 1, 11)));

    // 10 shares at 10 days, 5 shares at 5 days, 5 open shares to as-of
    // (2024-01-16: 10 days). Mean (100+25+50)/20 = 8.75 rounds to 9.
    let metrics = calculate_trade_metrics(&trade, dec!(100000), date(2024, 1, 16));
    assert_eq!(metrics.holding_days, 9);
}

#[test]
fn holding_days_degrades_on_missing_lot_dates() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.pyramid1 = lot(dec!(102), dec!(10), None);
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.holding_days, 0);

    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.exit1 = lot(dec!(110), dec!(5), None);
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.holding_days, 0);
}

#[test]
fn same_day_round_trip_counts_one_day() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    trade.exit1 = lot(dec!(101), dec!(10), Some(date(2024, 1, 1)));
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics.holding_days, 1);
}

#[test]
fn status_derivation_from_quantities() {
    assert_eq!(derive_status(dec!(10), Decimal::ZERO), TradeStatus::Open);
    assert_eq!(derive_status(dec!(10), dec!(10)), TradeStatus::Closed);
    assert_eq!(derive_status(dec!(10), dec!(4)), TradeStatus::Partial);
    assert_eq!(derive_status(dec!(10), dec!(15)), TradeStatus::Closed);
    assert_eq!(derive_status(Decimal::ZERO, Decimal::ZERO), TradeStatus::Open);
}

#[test]
fn open_heat_worked_example() {
    let mut trade = buy_trade(dec!(100), dec!(50));
    trade.stop_loss = dec!(90);
    assert_eq!(open_heat_contribution(&trade, dec!(100000)), dec!(0.5));
}

#[test]
fn open_heat_is_zero_when_stop_protects_the_entry() {
    let mut trade = buy_trade(dec!(100), dec!(50));
    trade.stop_loss = dec!(90);
    trade.trailing_stop = dec!(100);
    assert_eq!(open_heat_contribution(&trade, dec!(100000)), Decimal::ZERO);

    trade.trailing_stop = dec!(120);
    assert_eq!(open_heat_contribution(&trade, dec!(100000)), Decimal::ZERO);
}

#[test]
fn open_heat_prefers_the_trailing_stop() {
    let mut trade = buy_trade(dec!(100), dec!(50));
    trade.stop_loss = dec!(90);
    trade.trailing_stop = dec!(95);
    assert_eq!(open_heat_contribution(&trade, dec!(100000)), dec!(0.25));
}

#[test]
fn open_heat_skips_closed_trades_and_missing_inputs() {
    let mut closed = buy_trade(dec!(100), dec!(10));
    closed.stop_loss = dec!(90);
    closed.exit1 = lot(dec!(110), dec!(10), Some(date(2024, 1, 11)));
    assert_eq!(open_heat_contribution(&closed, dec!(100000)), Decimal::ZERO);

    let no_stop = buy_trade(dec!(100), dec!(10));
    assert_eq!(open_heat_contribution(&no_stop, dec!(100000)), Decimal::ZERO);

    let mut no_capital = buy_trade(dec!(100), dec!(10));
    no_capital.stop_loss = dec!(90);
    assert_eq!(open_heat_contribution(&no_capital, Decimal::ZERO), Decimal::ZERO);
}

#[test]
fn close_month_is_the_latest_exit() {
    let mut trade = buy_trade(dec!(100), dec!(10));
    assert_eq!(close_month(&trade), None);

    trade.exit1 = lot(dec!(105), dec!(4), Some(date(2024, 1, 20)));
    trade.exit2 = lot(dec!(108), dec!(4), Some(date(2024, 3, 2)));
    assert_eq!(close_month(&trade), Some((Month::Mar, 2024)));
}

#[test]
fn realized_pl_groups_by_close_month() {
    let mut first = buy_trade(dec!(100), dec!(10));
    first.exit1 = lot(dec!(110), dec!(10), Some(date(2024, 1, 15)));
    let mut second = buy_trade(dec!(200), dec!(5));
    second.id = "t2".to_string();
    second.exit1 = lot(dec!(190), dec!(5), Some(date(2024, 1, 20)));

    let by_month = realized_pl_by_close_month(&[first, second]);
    assert_eq!(by_month.get(&(Month::Jan, 2024)), Some(&dec!(50)));
    assert_eq!(by_month.len(), 1);
}

#[test]
fn empty_trade_yields_all_zero_metrics() {
    let trade = buy_trade(Decimal::ZERO, Decimal::ZERO);
    let metrics = calculate_trade_metrics(&trade, dec!(100000), as_of());
    assert_eq!(metrics, TradeMetrics::default());
}
