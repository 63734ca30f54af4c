#[cfg(test)]
mod test_optim {
    use approx::assert_relative_eq;
    use arrhenius_fit::prelude::*;
    use ndarray::Array1;
    use peroxide::fuga::RK4;

    fn fit_lm(dataset: &Dataset, initial: ParameterSet) -> FitReport {
        let problem = ProblemBuilder::new(dataset, RK4).build().unwrap();
        LevenbergMarquardtBuilder::default()
            .build()
            .optimize(&problem, Some(initial))
            .unwrap()
    }

    fn synthetic_dataset(truth: &ParameterSet) -> Dataset {
        Dataset::synthesize(
            truth,
            &DEFAULT_TEMPERATURES,
            &DEFAULT_TIMES,
            DEFAULT_INITIAL_CONCENTRATION,
            &SimulationSetup::default(),
            None,
        )
        .unwrap()
    }

    /// Fits the built-in dataset from the default starting guess and checks the
    /// estimates, their standard errors and the residual sum of squares.
    #[test]
    fn test_fit_default_dataset() {
        // ARRANGE
        let dataset = default_dataset();

        // ACT
        let report = fit_lm(&dataset, ParameterSet::default());

        // ASSERT
        assert_eq!(report.solver, LevenbergMarquardt::NAME);
        assert_eq!(report.n_points, 30);
        assert_eq!(report.dof, 26);
        assert!(report.iterations < 200, "Fit did not converge");

        let params = report.parameters;
        assert_relative_eq!(params.log10_a, 7.54, epsilon = 0.03);
        assert_relative_eq!(params.ea, 52.78, epsilon = 0.15);
        assert_relative_eq!(params.dh, -11.53, epsilon = 0.05);
        assert_relative_eq!(params.ds, -37.35, epsilon = 0.1);

        let errors = report.standard_errors;
        assert_relative_eq!(errors.log10_a, 0.43, max_relative = 0.03);
        assert_relative_eq!(errors.ea, 2.54, max_relative = 0.03);
        assert_relative_eq!(errors.dh, 0.79, max_relative = 0.03);
        assert_relative_eq!(errors.ds, 2.51, max_relative = 0.03);

        assert_relative_eq!(report.metrics.sse, 0.2305, max_relative = 1e-3);
    }

    /// Confidence intervals contain the estimate and the correlation matrix is
    /// symmetric with a unit diagonal.
    #[test]
    fn test_fit_statistics_are_consistent() {
        // ARRANGE
        let dataset = default_dataset();

        // ACT
        let report = fit_lm(&dataset, ParameterSet::default());

        // ASSERT
        let estimates = report.parameters.to_array();
        let errors = report.standard_errors.to_array();
        assert_eq!(report.confidence_intervals.len(), N_PARAMS);

        for i in 0..N_PARAMS {
            let ci = &report.confidence_intervals[i];
            assert!(ci.lower < estimates[i] && estimates[i] < ci.upper);
            assert_relative_eq!(
                report.covariance[i][i].sqrt(),
                errors[i],
                max_relative = 1e-12
            );
            assert_relative_eq!(report.correlation[i][i], 1.0, epsilon = 1e-12);

            for j in 0..N_PARAMS {
                assert_relative_eq!(
                    report.correlation[i][j],
                    report.correlation[j][i],
                    epsilon = 1e-12
                );
                assert!(report.correlation[i][j].abs() <= 1.0 + 1e-12);
            }
        }

        // logA and Ea are strongly positively correlated
        assert!(report.correlation[0][1] > 0.9);
    }

    /// The per-temperature rate summary satisfies Kc = kf / kr and
    /// Ceq = C0 / (1 + Kc).
    #[test]
    fn test_rate_summary_is_consistent() {
        // ARRANGE
        let dataset = default_dataset();

        // ACT
        let report = fit_lm(&dataset, ParameterSet::default());

        // ASSERT
        let temperatures: Vec<f64> = report.temperatures.iter().map(|s| s.temperature).collect();
        assert_eq!(temperatures, DEFAULT_TEMPERATURES.to_vec());

        for summary in &report.temperatures {
            assert_relative_eq!(summary.kc, summary.kf / summary.kr, max_relative = 1e-10);
            assert_relative_eq!(
                summary.equilibrium_concentration,
                DEFAULT_INITIAL_CONCENTRATION / (1.0 + summary.kc),
                max_relative = 1e-10
            );
        }

        // Exothermic: the equilibrium shifts back towards A at higher temperature
        let kcs: Vec<f64> = report.temperatures.iter().map(|s| s.kc).collect();
        assert!(kcs[0] > kcs[1] && kcs[1] > kcs[2]);

        assert_relative_eq!(report.temperatures[0].kf, 0.020863, max_relative = 0.05);
        assert_relative_eq!(report.temperatures[2].kc, 0.81044, max_relative = 0.05);
    }

    /// Refitting noise-free synthetic data from the generating parameters
    /// returns them unchanged.
    #[test]
    fn test_noise_free_recovery_from_truth() {
        // ARRANGE
        let truth = ParameterSet::new(7.5, 52.8, -11.5, -37.4);
        let dataset = synthetic_dataset(&truth);

        // ACT
        let report = fit_lm(&dataset, truth);

        // ASSERT
        assert_relative_eq!(report.metrics.sse, 0.0, epsilon = 1e-20);
        for (estimate, expected) in report
            .parameters
            .to_array()
            .iter()
            .zip(truth.to_array().iter())
        {
            assert_relative_eq!(*estimate, *expected, max_relative = 1e-12);
        }
    }

    /// A perturbed start on noise-free synthetic data converges back to the
    /// generating parameters.
    #[test]
    fn test_noise_free_recovery_from_perturbed_start() {
        // ARRANGE
        let truth = ParameterSet::new(7.5, 52.8, -11.5, -37.4);
        let dataset = synthetic_dataset(&truth);
        let start = ParameterSet::new(7.55, 53.1, -11.4, -37.1);

        // ACT
        let report = fit_lm(&dataset, start);

        // ASSERT
        assert!(report.metrics.sse < 1e-16);
        for (estimate, expected) in report
            .parameters
            .to_array()
            .iter()
            .zip(truth.to_array().iter())
        {
            assert_relative_eq!(*estimate, *expected, max_relative = 1e-6);
        }
    }

    /// Multiplying every concentration by a constant leaves the estimates and
    /// their uncertainties unchanged.
    #[test]
    fn test_scaling_invariance() {
        // ARRANGE
        let dataset = default_dataset();
        let scaled = dataset.scaled(2.5);

        // ACT
        let report = fit_lm(&dataset, ParameterSet::default());
        let scaled_report = fit_lm(&scaled, ParameterSet::default());

        // ASSERT
        let pairs = report
            .parameters
            .to_array()
            .into_iter()
            .zip(scaled_report.parameters.to_array());
        for (original, rescaled) in pairs {
            assert_relative_eq!(original, rescaled, max_relative = 1e-6);
        }

        let pairs = report
            .standard_errors
            .to_array()
            .into_iter()
            .zip(scaled_report.standard_errors.to_array());
        for (original, rescaled) in pairs {
            assert_relative_eq!(original, rescaled, max_relative = 1e-4);
        }

        assert_relative_eq!(
            scaled_report.metrics.sse,
            report.metrics.sse * 6.25,
            max_relative = 1e-6
        );
    }

    /// L-BFGS started at the Levenberg-Marquardt optimum does not increase
    /// the sum of squared residuals.
    #[test]
    fn test_lbfgs_keeps_optimum() {
        // ARRANGE
        let dataset = default_dataset();
        let lm_report = fit_lm(&dataset, ParameterSet::default());
        let problem = ProblemBuilder::new(&dataset, RK4).build().unwrap();

        // ACT
        let report = LBFGSBuilder::default()
            .max_iters(1)
            .build()
            .optimize(&problem, Some(lm_report.parameters))
            .unwrap();

        // ASSERT
        assert_eq!(report.solver, LBFGS::NAME);
        assert!(report.metrics.sse <= lm_report.metrics.sse * (1.0 + 1e-9));
    }

    #[test]
    fn test_lbfgs_noise_free_recovery() {
        // ARRANGE
        let truth = ParameterSet::new(7.5, 52.8, -11.5, -37.4);
        let dataset = synthetic_dataset(&truth);
        let problem = ProblemBuilder::new(&dataset, RK4).build().unwrap();

        // ACT
        let report = LBFGSBuilder::default()
            .build()
            .optimize(&problem, Some(truth))
            .unwrap();

        // ASSERT
        assert_eq!(report.parameters, truth);
    }

    /// Without an explicit guess the fit starts from the default parameters.
    #[test]
    fn test_default_initial_guess() {
        // ARRANGE
        let dataset = default_dataset();
        let problem = ProblemBuilder::new(&dataset, RK4).build().unwrap();

        // ACT
        let report = LevenbergMarquardtBuilder::default()
            .max_iters(1)
            .build()
            .optimize(&problem, None::<ParameterSet>)
            .unwrap();

        // ASSERT
        assert_eq!(report.initial_guess, ParameterSet::default());
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn test_wrong_guess_length_is_rejected() {
        let dataset = default_dataset();
        let problem = ProblemBuilder::new(&dataset, RK4).build().unwrap();

        let result = LevenbergMarquardtBuilder::default()
            .build()
            .optimize(&problem, Some(Array1::from_vec(vec![1.0, 2.0, 3.0])));

        assert!(matches!(
            result,
            Err(OptimizeError::InitialGuessLengthError {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_parameter_parsing() {
        let params: ParameterSet = "6, 45,-10,-50".parse().unwrap();
        assert_eq!(params, ParameterSet::default());

        assert!(matches!(
            "6,45,abc,-50".parse::<ParameterSet>(),
            Err(OptimizeError::ParameterParseError(_))
        ));
        assert!(matches!(
            "6,45".parse::<ParameterSet>(),
            Err(OptimizeError::InitialGuessLengthError { .. })
        ));
    }

    /// The fit report serializes to JSON with its estimates and rate summary.
    #[test]
    fn test_report_to_json() {
        // ARRANGE
        let dataset = default_dataset();
        let report = fit_lm(&dataset, ParameterSet::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        // ACT
        save_json(&path, &report).unwrap();

        // ASSERT
        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["solver"], LevenbergMarquardt::NAME);
        assert_eq!(value["temperatures"].as_array().unwrap().len(), 3);
        assert_eq!(value["fits"].as_array().unwrap().len(), 3);
        assert_relative_eq!(
            value["parameters"]["ea"].as_f64().unwrap(),
            report.parameters.ea,
            max_relative = 1e-12
        );
        assert!(value["metrics"]["sse"].as_f64().is_some());
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let dataset = Dataset::new(vec![]);
        let result = ProblemBuilder::new(&dataset, RK4).build();
        assert!(matches!(result, Err(OptimizeError::DataError(_))));
    }
}
