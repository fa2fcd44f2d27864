//! Plain-text summary of a prepared bundle.

use crate::domain::{DatasetBundle, LoadOptions, SplitArray};

/// Format the bundle summary printed by `gefcom build`.
pub fn format_bundle_summary(bundle: &DatasetBundle, options: &LoadOptions) -> String {
    let mut out = String::new();

    out.push_str("=== gefcom - GEFCom2014 load data ===\n");
    out.push_str(&format!(
        "Split: {} | mode: {} | exogenous: {} | detrend: {} | fill: {:?}\n",
        options.split_type,
        if options.is_train { "train/valid" } else { "train/test" },
        yes_no(options.exogenous_vars),
        yes_no(options.detrend),
        options.fill_nan,
    ));
    out.push_str(&format!(
        "Lengths: train={} valid={} test={}\n",
        options.train_len,
        options.effective_valid_len(),
        options.test_len
    ));

    out.push('\n');
    out.push_str(&format!("{:<8} {}\n", "train", describe(&bundle.train)));
    let held_out = if options.is_train { "valid" } else { "test" };
    out.push_str(&format!("{:<8} {}\n", held_out, describe(&bundle.test)));

    out.push_str("\nScaler:\n");
    match &bundle.scaler {
        Some(s) => {
            out.push_str(&format!("- kind  : {:?}\n", s.kind()));
            out.push_str(&format!("- offset: {}\n", fmt_vec(s.offset())));
            out.push_str(&format!("- scale : {}\n", fmt_vec(s.scale())));
        }
        None => out.push_str("- none (unscaled features)\n"),
    }

    if let Some(trend) = &bundle.trend {
        out.push_str("\nTrend:\n");
        out.push_str(&format!("- train: {}\n", describe(&trend.train)));
        out.push_str(&format!("- {held_out:<5}: {}\n", describe(&trend.test)));
    }

    out
}

fn describe(a: &SplitArray) -> String {
    match a {
        SplitArray::Contiguous(m) => format!("contiguous {} x {}", m.nrows(), m.ncols()),
        SplitArray::Windowed(_) => format!(
            "{} window(s) of {} x {}",
            a.n_windows(),
            a.n_rows(),
            a.n_features()
        ),
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScalerKind, TrendSplit};
    use crate::math::Scaler;
    use nalgebra::DMatrix;

    fn bundle() -> DatasetBundle {
        let x = DMatrix::from_column_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
        DatasetBundle {
            train: SplitArray::Windowed(vec![DMatrix::zeros(10, 3); 4]),
            test: SplitArray::Contiguous(DMatrix::zeros(5, 3)),
            scaler: Some(Scaler::fit(&x, ScalerKind::Standard).unwrap()),
            trend: None,
        }
    }

    #[test]
    fn summary_lists_partitions_and_scaler() {
        let text = format_bundle_summary(&bundle(), &LoadOptions::default());
        assert!(text.contains("Split: simple | mode: train/test"));
        assert!(text.contains("train    4 window(s) of 10 x 3"));
        assert!(text.contains("test     contiguous 5 x 3"));
        assert!(text.contains("- offset: [2.500000]"));
        assert!(!text.contains("Trend:"));
    }

    #[test]
    fn summary_in_train_mode_names_validation_and_trend() {
        let mut b = bundle();
        b.scaler = None;
        b.trend = Some(TrendSplit {
            train: SplitArray::Contiguous(DMatrix::zeros(10, 1)),
            test: SplitArray::Contiguous(DMatrix::zeros(2, 1)),
        });
        let options = LoadOptions {
            is_train: true,
            detrend: true,
            ..LoadOptions::default()
        };
        let text = format_bundle_summary(&b, &options);
        assert!(text.contains("valid    contiguous 5 x 3"));
        assert!(text.contains("- none (unscaled features)"));
        assert!(text.contains("- valid: contiguous 2 x 1"));
    }
}
