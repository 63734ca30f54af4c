use ndarray::Array1;
use serde::Serialize;

/// Calculates the sum of squared errors (SSE) between predicted and actual values.
///
/// SSE = Σ(y_pred - y_actual)²
///
/// # Arguments
/// * `residuals` - Residuals (differences between observed and predicted values)
///
/// # Returns
/// * `f64` - Sum of squared errors
pub fn sum_of_squared_errors(residuals: &Array1<f64>) -> f64 {
    residuals.mapv(|x| x * x).sum()
}

/// Calculates Mean Squared Error (MSE). Lower values indicate better fit.
///
/// MSE = (1/n) * Σ(y_pred - y_actual)²
///
/// # Arguments
/// * `residuals` - Residuals (differences between observed and predicted values)
///
/// # Returns
/// * `f64` - Mean squared error value
pub fn mean_squared_error(residuals: &Array1<f64>) -> f64 {
    sum_of_squared_errors(residuals) / residuals.len() as f64
}

/// Calculates Root Mean Squared Error (RMSE), the square root of MSE.
/// RMSE is in the same units as the observed concentrations.
pub fn root_mean_squared_error(residuals: &Array1<f64>) -> f64 {
    mean_squared_error(residuals).sqrt()
}

/// Calculates Akaike Information Criterion (AIC), a measure of model quality that balances
/// goodness of fit against model complexity. Lower values indicate better models.
///
/// AIC = n * ln(SSE/n) + 2k
/// where:
/// - n is the number of data points
/// - SSE is the sum of squared errors
/// - k is the number of model parameters
///
/// # Arguments
/// * `residuals` - Residuals (differences between observed and predicted values)
/// * `num_parameters` - Number of parameters in the model
///
/// # Returns
/// * `f64` - AIC value
pub fn akaike_information_criterion(residuals: &Array1<f64>, num_parameters: usize) -> f64 {
    let n = residuals.len() as f64;
    let sse = sum_of_squared_errors(residuals);
    n * (sse / n).ln() + 2.0 * num_parameters as f64
}

/// Calculates Bayesian Information Criterion (BIC), similar to AIC but with a stronger penalty
/// for model complexity. Lower values indicate better models.
///
/// BIC = n * ln(SSE/n) + k * ln(n)
///
/// # Arguments
/// * `residuals` - Residuals (differences between observed and predicted values)
/// * `num_parameters` - Number of parameters in the model
///
/// # Returns
/// * `f64` - BIC value
pub fn bayesian_information_criterion(residuals: &Array1<f64>, num_parameters: usize) -> f64 {
    let n = residuals.len() as f64;
    let sse = sum_of_squared_errors(residuals);
    n * (sse / n).ln() + num_parameters as f64 * n.ln()
}

/// Collection of metrics evaluating the fit at the best parameters
///
/// Lower values indicate better model fit for all metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub sse: f64,
    pub mse: f64,
    pub rmse: f64,
    pub aic: f64,
    pub bic: f64,
}

impl Metrics {
    pub fn new(residuals: &Array1<f64>, num_parameters: usize) -> Self {
        Self {
            sse: sum_of_squared_errors(residuals),
            mse: mean_squared_error(residuals),
            rmse: root_mean_squared_error(residuals),
            aic: akaike_information_criterion(residuals, num_parameters),
            bic: bayesian_information_criterion(residuals, num_parameters),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn test_metrics() {
        let residuals = array![1.0, -2.0, 2.0, 1.0];
        let metrics = Metrics::new(&residuals, 1);

        assert_eq!(metrics.sse, 10.0);
        assert_eq!(metrics.mse, 2.5);
        assert_relative_eq!(metrics.rmse, 2.5f64.sqrt());
        assert_relative_eq!(metrics.aic, 4.0 * 2.5f64.ln() + 2.0);
        assert_relative_eq!(metrics.bic, 4.0 * 2.5f64.ln() + 4.0f64.ln());
    }
}
