use crate::config::SeasonalityMode;

/// Minimum history span, in months, before `SeasonalityMode::Auto` fits a yearly component.
pub const AUTO_SEASONALITY_MIN_SPAN_MONTHS: i32 = 24;

pub fn seasonality_enabled(mode: SeasonalityMode, span_months: i32) -> bool {
    match mode {
        SeasonalityMode::Auto => span_months >= AUTO_SEASONALITY_MIN_SPAN_MONTHS,
        SeasonalityMode::Enabled => true,
        SeasonalityMode::Disabled => false,
    }
}

/// Additive calendar-month offsets (index 0 = January) from detrended residuals.
///
/// Each observed month gets the mean of its residuals; the offsets are then centred so
/// they average to zero over the observed months. Months never observed stay at zero.
pub fn estimate_monthly_offsets(months: &[usize], residuals: &[f64]) -> [f64; 12] {
    let mut sums = [0.0; 12];
    let mut counts = [0usize; 12];

    for (&month, &residual) in months.iter().zip(residuals) {
        let idx = month % 12;
        sums[idx] += residual;
        counts[idx] += 1;
    }

    let mut offsets = [0.0; 12];
    for idx in 0..12 {
        if counts[idx] > 0 {
            offsets[idx] = sums[idx] / counts[idx] as f64;
        }
    }

    center_offsets(&mut offsets, &counts);
    offsets
}

pub fn observed_month_count(months: &[usize]) -> usize {
    let mut seen = [false; 12];
    for &month in months {
        seen[month % 12] = true;
    }
    seen.iter().filter(|&&s| s).count()
}

fn center_offsets(offsets: &mut [f64; 12], counts: &[usize; 12]) {
    let observed = counts.iter().filter(|&&c| c > 0).count();
    if observed == 0 {
        return;
    }

    let mean = offsets
        .iter()
        .zip(counts)
        .filter(|&(_, &c)| c > 0)
        .map(|(o, _)| o)
        .sum::<f64>()
        / observed as f64;

    for (offset, &count) in offsets.iter_mut().zip(counts) {
        if count > 0 {
            *offset -= mean;
        }
    }
}
