//! Production capacity, mix batching, changeover linking and labour hours.

use coldchain_core::DayKind;

use crate::builder::{product_mix_size, PlanVariables};
use crate::index::PlanIndex;
use crate::model::{LinExpr, ModelSpec, RowSense};
use crate::prep::PreparedInput;
use crate::scale::ScaleFactor;

pub(crate) fn add_rows(
    model: &mut ModelSpec,
    vars: &PlanVariables,
    prepared: &PreparedInput<'_>,
    index: &PlanIndex,
    scale: &ScaleFactor,
) {
    let network = prepared.network();
    let start = prepared.horizon().start;
    let products: Vec<_> = prepared.input.products.iter().map(|p| p.id).collect();

    for &(n, p, t) in &index.production {
        let node = network.node(n).expect("indexed node");
        let Some(mfg) = node.manufacturing.as_ref() else {
            continue;
        };
        let production = vars.production[&(n, p, t)];
        let produced = vars.product_produced[&(n, p, t)];

        // production = mix_count * units_per_mix (scaled mix size).
        let mix_size = scale.flow(product_mix_size(prepared, p));
        let expr = LinExpr::new()
            .term(production, 1.0)
            .term(vars.mix_count[&(n, p, t)], -mix_size);
        model.add_row(format!("mix_link[{},{},{}]", n, p, t), expr, RowSense::Eq, 0.0);

        // Big-M link: production can be non-zero only on produced days; the
        // daily capacity is the natural M.
        let cap = scale.flow(mfg.max_daily_units);
        let expr = LinExpr::new().term(production, 1.0).term(produced, -cap);
        model.add_row(
            format!("made_link[{},{},{}]", n, p, t),
            expr,
            RowSense::Le,
            0.0,
        );

        // Changeover indicator: start >= produced(t) - produced(t-1). The
        // first horizon date compares against a not-produced prior day.
        let mut expr = LinExpr::new()
            .term(produced, 1.0)
            .term(vars.product_start[&(n, p, t)], -1.0);
        if t > start {
            let prev = t.pred_opt().expect("date underflow");
            if let Some(&prior) = vars.product_produced.get(&(n, p, prev)) {
                expr.add_term(prior, -1.0);
            }
        }
        model.add_row(
            format!("start_link[{},{},{}]", n, p, t),
            expr,
            RowSense::Le,
            0.0,
        );
    }

    for &(n, t) in &index.labor_days {
        let node = network.node(n).expect("indexed node");
        let Some(mfg) = node.manufacturing.as_ref() else {
            continue;
        };
        let active = vars.day_active[&(n, t)];
        let used = vars.labor_used[&(n, t)];
        let paid = vars.labor_paid[&(n, t)];

        // Daily capacity across products.
        let mut expr = LinExpr::new();
        for &p in &products {
            if let Some(&v) = vars.production.get(&(n, p, t)) {
                expr.add_term(v, 1.0);
            }
        }
        if !expr.is_empty() {
            model.add_row(
                format!("capacity[{},{}]", n, t),
                expr,
                RowSense::Le,
                scale.flow(mfg.max_daily_units),
            );
        }

        // day_active is 1 iff any product runs.
        let mut sum_produced = LinExpr::new().term(active, 1.0);
        for &p in &products {
            if let Some(&produced) = vars.product_produced.get(&(n, p, t)) {
                sum_produced.add_term(produced, -1.0);
                let expr = LinExpr::new().term(produced, 1.0).term(active, -1.0);
                model.add_row(
                    format!("active_ge[{},{},{}]", n, p, t),
                    expr,
                    RowSense::Le,
                    0.0,
                );
            }
        }
        model.add_row(
            format!("active_le[{},{}]", n, t),
            sum_produced,
            RowSense::Le,
            0.0,
        );

        // Hours used: run time plus overheads. With k products running the
        // overhead is startup + shutdown + (k-1)*changeover + k*per_product,
        // expressed through day_active and the per-product indicators.
        let mut expr = LinExpr::new().term(used, 1.0);
        let run_coeff = scale.value() / mfg.rate_units_per_hour;
        for &p in &products {
            if let Some(&v) = vars.production.get(&(n, p, t)) {
                expr.add_term(v, -run_coeff);
            }
            if let Some(&produced) = vars.product_produced.get(&(n, p, t)) {
                expr.add_term(produced, -(mfg.changeover_hours + mfg.per_product_hours));
            }
        }
        expr.add_term(
            active,
            -(mfg.startup_hours + mfg.shutdown_hours - mfg.changeover_hours),
        );
        model.add_row(format!("hours_used[{},{}]", n, t), expr, RowSense::Eq, 0.0);

        // Paid hours: at least used, decomposed into rate buckets.
        let expr = LinExpr::new().term(paid, 1.0).term(used, -1.0);
        model.add_row(format!("paid_ge_used[{},{}]", n, t), expr, RowSense::Ge, 0.0);

        let expr = LinExpr::new()
            .term(paid, 1.0)
            .term(vars.labor_base[&(n, t)], -1.0)
            .term(vars.labor_premium[&(n, t)], -1.0);
        model.add_row(format!("paid_split[{},{}]", n, t), expr, RowSense::Eq, 0.0);

        // Non-fixed days with any production pay a minimum shift.
        if let DayKind::NonFixed {
            minimum_paid_hours, ..
        } = prepared.input.calendar.day(n, t).expect("calendar").kind
        {
            let expr = LinExpr::new()
                .term(paid, 1.0)
                .term(active, -minimum_paid_hours);
            model.add_row(format!("min_paid[{},{}]", n, t), expr, RowSense::Ge, 0.0);
        }
    }
}
