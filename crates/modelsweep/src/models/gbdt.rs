use anyhow::{bail, Result};
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

use crate::math::Array2;
use crate::models::factory::ModelKind;
use crate::models::model_trait::Regressor;

/// Rows of `x` as gbdt samples; `y` defaults to 0 for prediction data.
pub(crate) fn to_datavec(x: &Array2<f32>, y: Option<&[f32]>) -> DataVec {
    let mut data = DataVec::with_capacity(x.nrows());
    for row in 0..x.nrows() {
        let label = y.map(|y| y[row]).unwrap_or(0.0);
        data.push(Data::new_training_data(x.row_slice(row).to_vec(), 1.0, label, None));
    }
    data
}

/// One unshrunk squared-error tree, the building block of the bagged and
/// AdaBoost ensembles.
pub(crate) fn fit_single_tree(x: &Array2<f32>, y: &[f32], max_depth: u32) -> GBDT {
    let mut config = Config::new();
    config.set_feature_size(x.ncols());
    config.set_shrinkage(1.0);
    config.set_max_depth(max_depth);
    config.set_iterations(1);
    config.set_min_leaf_size(1);
    config.set_debug(false);
    config.set_loss("SquaredError");

    let mut model = GBDT::new(&config);
    model.fit(&mut to_datavec(x, Some(y)));
    model
}

/// Squared-error gradient boosted trees.
pub struct GbdtRegressor {
    model: Option<GBDT>,
    params: ModelKind,
}

impl GbdtRegressor {
    pub fn new(params: ModelKind) -> Self {
        GbdtRegressor {
            model: None,
            params,
        }
    }
}

impl Regressor for GbdtRegressor {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        let ModelKind::Boosting {
            rounds,
            max_depth,
            learning_rate,
            min_leaf_size,
        } = &self.params
        else {
            bail!("Expected boosting parameters, got {:?}", self.params);
        };
        if x.nrows() == 0 {
            bail!("Cannot fit boosted trees on an empty training set");
        }

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(*learning_rate);
        config.set_max_depth(*max_depth);
        config.set_iterations(*rounds);
        config.set_min_leaf_size(*min_leaf_size);
        config.set_debug(false);
        config.set_training_optimization_level(2);
        config.set_loss("SquaredError");

        let mut gbdt = GBDT::new(&config);
        let mut train_x = to_datavec(x, Some(y));
        gbdt.fit(&mut train_x);

        self.model = Some(gbdt);
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        match &self.model {
            Some(model) => model.predict(&to_datavec(x, None)),
            None => vec![0.0; x.nrows()],
        }
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_a_step_function() {
        let n = 40;
        let mut data = Vec::with_capacity(n * 2);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f32 / n as f32;
            data.extend_from_slice(&[a, 1.0]);
            y.push(if a < 0.5 { 0.0 } else { 10.0 });
        }
        let x = Array2::from_shape_vec((n, 2), data).unwrap();

        let mut model = GbdtRegressor::new(ModelKind::Boosting {
            rounds: 50,
            max_depth: 3,
            learning_rate: 0.3,
            min_leaf_size: 1,
        });
        model.fit(&x, &y).unwrap();
        let predictions = model.predict(&x);

        assert_eq!(predictions.len(), n);
        assert!(predictions[0] < predictions[n - 1]);
    }

    #[test]
    fn rejects_wrong_parameters() {
        let x = Array2::from_shape_vec((1, 1), vec![0.0]).unwrap();
        let mut model = GbdtRegressor::new(ModelKind::Knn { k: 1 });
        assert!(model.fit(&x, &[1.0]).is_err());
    }
}
