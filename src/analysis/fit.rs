//! # 高斯拟合
//!
//! 两种估计：
//! - 正态分布矩估计（最大似然）：样本均值与总体标准差
//! - 带常数偏移的高斯函数对直方图的最小二乘拟合（Levenberg–Marquardt）
//!
//! `f(x) = d + a·exp(-(x - b)² / (2c²))`
//!
//! 参数误差取协方差矩阵对角线的平方根，协方差按残差方差缩放。
//!
//! ## 依赖关系
//! - 被 `analysis/summary.rs` 调用
//! - 无外部模块依赖

use crate::error::FitError;

/// 矩估计所需的最少样本数
pub const MIN_SAMPLES: usize = 3;

/// 最小二乘拟合所需的最少数据点（箱）数
pub const MIN_BINS: usize = 4;

/// 高斯函数参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
    pub offset: f64,
}

impl GaussianParams {
    pub fn eval(&self, x: f64) -> f64 {
        let z = (x - self.center) / self.sigma;
        self.offset + self.amplitude * (-0.5 * z * z).exp()
    }

    fn to_array(self) -> [f64; 4] {
        [self.amplitude, self.center, self.sigma, self.offset]
    }

    fn from_array(p: [f64; 4]) -> Self {
        GaussianParams {
            amplitude: p[0],
            center: p[1],
            sigma: p[2],
            offset: p[3],
        }
    }

    fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// 正态分布矩估计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalEstimate {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// 最小二乘拟合结果
#[derive(Debug, Clone, Copy)]
pub struct GaussianFit {
    pub params: GaussianParams,
    /// 1σ 参数误差；无法确定时为无穷大
    pub errors: GaussianParams,
    pub iterations: usize,
    /// 残差平方和
    pub rss: f64,
}

/// 样本均值与总体标准差
pub fn estimate_normal(samples: &[f64]) -> Result<NormalEstimate, FitError> {
    let n = samples.len();
    if n < MIN_SAMPLES {
        return Err(FitError::TooFewSamples {
            count: n,
            required: MIN_SAMPLES,
        });
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std = var.sqrt();

    if !std.is_finite() || std <= 0.0 {
        return Err(FitError::Degenerate("all widths are identical".to_string()));
    }

    Ok(NormalEstimate {
        mean,
        std,
        count: n,
    })
}

/// Levenberg–Marquardt 高斯拟合器
pub struct GaussianFitter {
    max_iterations: usize,
    tolerance: f64,
}

impl Default for GaussianFitter {
    fn default() -> Self {
        Self::new(200, 1e-10)
    }
}

impl GaussianFitter {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// 拟合 (x, y) 数据
    pub fn fit(
        &self,
        x: &[f64],
        y: &[f64],
        initial: GaussianParams,
    ) -> Result<GaussianFit, FitError> {
        let m = x.len().min(y.len());
        if m < MIN_BINS {
            return Err(FitError::Degenerate(format!(
                "need at least {} histogram bins, got {}",
                MIN_BINS, m
            )));
        }
        if initial.sigma == 0.0 || !initial.is_finite() {
            return Err(FitError::Degenerate("invalid initial guess".to_string()));
        }

        let (x, y) = (&x[..m], &y[..m]);
        let mut p = initial.to_array();
        let mut rss = residual_sum(x, y, p);
        let mut lambda = 1e-3;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            let (jtj, jtr) = normal_equations(x, y, p);

            let mut step = None;
            while lambda < 1e16 {
                let mut a = jtj;
                for (k, row) in a.iter_mut().enumerate() {
                    row[k] += lambda * jtj[k][k].max(1e-12);
                }
                if let Some(delta) = solve4(a, jtr) {
                    let trial = [
                        p[0] + delta[0],
                        p[1] + delta[1],
                        p[2] + delta[2],
                        p[3] + delta[3],
                    ];
                    let trial_rss = residual_sum(x, y, trial);
                    if trial_rss.is_finite() && trial_rss < rss {
                        step = Some((trial, trial_rss, delta));
                        break;
                    }
                }
                lambda *= 10.0;
            }

            match step {
                Some((trial, trial_rss, delta)) => {
                    let rss_change = (rss - trial_rss).abs();
                    let step_size = delta
                        .iter()
                        .zip(trial.iter())
                        .map(|(d, v)| (d / v.abs().max(1e-12)).abs())
                        .fold(0.0, f64::max);
                    p = trial;
                    rss = trial_rss;
                    lambda = (lambda / 10.0).max(1e-12);

                    if rss_change <= self.tolerance * rss.max(1e-300) || step_size < 1e-9 {
                        converged = true;
                        break;
                    }
                }
                None => {
                    // 任何阻尼下都无法继续下降：已处于极小值
                    converged = true;
                    break;
                }
            }
        }

        let params = GaussianParams::from_array(p);
        if !converged || !params.is_finite() || params.sigma == 0.0 {
            return Err(FitError::NotConverged { iterations });
        }

        let params = GaussianParams {
            sigma: params.sigma.abs(),
            ..params
        };

        let errors = parameter_errors(x, y, p, rss);

        Ok(GaussianFit {
            params,
            errors,
            iterations,
            rss,
        })
    }
}

fn model(x: f64, p: [f64; 4]) -> f64 {
    let z = (x - p[1]) / p[2];
    p[3] + p[0] * (-0.5 * z * z).exp()
}

/// 对参数的偏导数
fn jacobian_row(x: f64, p: [f64; 4]) -> [f64; 4] {
    let dx = x - p[1];
    let c2 = p[2] * p[2];
    let e = (-0.5 * dx * dx / c2).exp();
    [e, p[0] * e * dx / c2, p[0] * e * dx * dx / (c2 * p[2]), 1.0]
}

fn residual_sum(x: &[f64], y: &[f64], p: [f64; 4]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - model(xi, p)).powi(2))
        .sum()
}

/// JᵀJ 与 Jᵀr
fn normal_equations(x: &[f64], y: &[f64], p: [f64; 4]) -> ([[f64; 4]; 4], [f64; 4]) {
    let mut jtj = [[0.0; 4]; 4];
    let mut jtr = [0.0; 4];
    for (&xi, &yi) in x.iter().zip(y) {
        let j = jacobian_row(xi, p);
        let r = yi - model(xi, p);
        for a in 0..4 {
            jtr[a] += j[a] * r;
            for b in 0..4 {
                jtj[a][b] += j[a] * j[b];
            }
        }
    }
    (jtj, jtr)
}

fn parameter_errors(x: &[f64], y: &[f64], p: [f64; 4], rss: f64) -> GaussianParams {
    let undetermined = GaussianParams::from_array([f64::INFINITY; 4]);
    let dof = x.len().saturating_sub(4);
    if dof == 0 {
        return undetermined;
    }

    let (jtj, _) = normal_equations(x, y, p);
    let scale = rss / dof as f64;

    let mut errors = [0.0; 4];
    for (k, err) in errors.iter_mut().enumerate() {
        let mut unit = [0.0; 4];
        unit[k] = 1.0;
        match solve4(jtj, unit) {
            Some(col) if col[k] >= 0.0 => *err = (col[k] * scale).sqrt(),
            _ => return undetermined,
        }
    }
    GaussianParams::from_array(errors)
}

/// 4×4 线性方程组（部分主元高斯消元）；奇异时返回 None
fn solve4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 || !a[pivot][col].is_finite() {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut out = [0.0; 4];
    for row in (0..4).rev() {
        let tail: f64 = (row + 1..4).map(|k| a[row][k] * out[k]).sum();
        out[row] = (b[row] - tail) / a[row][row];
    }
    out.iter().all(|v| v.is_finite()).then_some(out)
}

/// 确定性伪随机正态样本（xorshift + Box–Muller）
#[cfg(test)]
pub(crate) fn normal_samples(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut uniform = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        ((state >> 11) as f64 + 0.5) / (1u64 << 53) as f64
    };
    (0..n)
        .map(|_| {
            let (u1, u2) = (uniform(), uniform());
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + std * z
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_normal_recovers_parameters() {
        let samples = normal_samples(5000, 7.0, 1.0, 42);
        let est = estimate_normal(&samples).unwrap();
        assert!((est.mean - 7.0).abs() < 0.7, "mean = {}", est.mean);
        assert!((est.std - 1.0).abs() < 0.1, "std = {}", est.std);
        assert_eq!(est.count, 5000);
    }

    #[test]
    fn test_estimate_normal_failures() {
        assert_eq!(
            estimate_normal(&[1.0, 2.0]),
            Err(FitError::TooFewSamples {
                count: 2,
                required: 3
            })
        );
        assert!(matches!(
            estimate_normal(&[4.0, 4.0, 4.0]),
            Err(FitError::Degenerate(_))
        ));
    }

    #[test]
    fn test_fit_exact_gaussian() {
        let truth = GaussianParams {
            amplitude: 20.0,
            center: 73.0,
            sigma: 12.0,
            offset: 1.5,
        };
        let x: Vec<f64> = (0..60).map(|i| i as f64 * 2.5).collect();
        let y: Vec<f64> = x.iter().map(|&v| truth.eval(v)).collect();
        let initial = GaussianParams {
            amplitude: 15.0,
            center: 65.0,
            sigma: 20.0,
            offset: 0.0,
        };

        let fit = GaussianFitter::default().fit(&x, &y, initial).unwrap();
        assert!((fit.params.amplitude - 20.0).abs() < 1e-4);
        assert!((fit.params.center - 73.0).abs() < 1e-4);
        assert!((fit.params.sigma - 12.0).abs() < 1e-4);
        assert!((fit.params.offset - 1.5).abs() < 1e-4);
        assert!(fit.rss < 1e-6);
    }

    #[test]
    fn test_negative_sigma_reported_positive() {
        let truth = GaussianParams {
            amplitude: 5.0,
            center: 10.0,
            sigma: 2.0,
            offset: 0.0,
        };
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&v| truth.eval(v)).collect();
        let initial = GaussianParams {
            sigma: -2.5,
            ..truth
        };
        let fit = GaussianFitter::default().fit(&x, &y, initial).unwrap();
        assert!((fit.params.sigma - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_fit_rejects_too_few_points() {
        let initial = GaussianParams {
            amplitude: 1.0,
            center: 0.0,
            sigma: 1.0,
            offset: 0.0,
        };
        let err = GaussianFitter::default()
            .fit(&[0.0, 1.0, 2.0], &[1.0, 2.0, 1.0], initial)
            .unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let truth = GaussianParams {
            amplitude: 20.0,
            center: 50.0,
            sigma: 8.0,
            offset: 0.0,
        };
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 2.0).collect();
        let y: Vec<f64> = x.iter().map(|&v| truth.eval(v)).collect();
        let initial = GaussianParams {
            amplitude: 5.0,
            center: 30.0,
            sigma: 20.0,
            offset: 3.0,
        };
        let err = GaussianFitter::new(1, 1e-10).fit(&x, &y, initial).unwrap_err();
        assert_eq!(err, FitError::NotConverged { iterations: 1 });
    }

    #[test]
    fn test_solve4() {
        let a = [
            [2.0, 0.0, 0.0, 1.0],
            [0.0, 3.0, 0.0, 0.0],
            [1.0, 0.0, 4.0, 0.0],
            [0.0, 0.0, 0.0, 5.0],
        ];
        let x = solve4(a, [3.0, 3.0, 5.0, 5.0]).unwrap();
        for (v, e) in x.iter().zip([1.0, 1.0, 1.0, 1.0]) {
            assert!((v - e).abs() < 1e-12);
        }
        assert!(solve4([[0.0; 4]; 4], [1.0; 4]).is_none());
    }
}
