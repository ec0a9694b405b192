//! Small numeric helpers shared by the forecaster and the correlation analysis

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Ordinary least squares fit of `y` against its index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to 0..1
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit `values[i]` against `x = i`
    ///
    /// Returns `None` for fewer than two values. A series with no variance is a
    /// perfect fit of a flat line and reports an R² of 1.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }

        let n_f = n as f64;
        let sum_x: f64 = (0..n).map(|i| i as f64).sum();
        let sum_y: f64 = values.iter().sum();
        let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
        let sum_xx: f64 = (0..n).map(|i| (i as f64).powi(2)).sum();

        let denominator = n_f * sum_xx - sum_x * sum_x;
        if denominator == 0.0 {
            return None;
        }

        let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n_f;

        let y_mean = sum_y / n_f;
        let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum();

        let r_squared = if ss_tot == 0.0 {
            1.0
        } else {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        };

        Some(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    /// Value of the fitted line at index `x`
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Pearson correlation coefficient of two equal-length series
///
/// Returns 0 when either series has no variance, when the lengths differ or
/// when fewer than two pairs are available. The result is clamped to -1..1.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}
