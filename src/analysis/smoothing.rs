//! # 剖面平滑
//!
//! 居中滑动中值滤波，与 ImageJ 中的 median filter 对应。
//! 边缘使用截断窗口，输出长度与输入相同。
//!
//! ## 依赖关系
//! - 被 `analysis/minima.rs` 调用

use std::borrow::Cow;

/// 滑动中值滤波
///
/// `window` 为采样点数；偶数向上取为奇数，`window <= 1` 时原样返回。
pub fn median_filter(values: &[f64], window: usize) -> Cow<'_, [f64]> {
    if window <= 1 || values.len() < 2 {
        return Cow::Borrowed(values);
    }

    let n = values.len();
    // 窗口超过剖面长度时等价于整条剖面
    let half = (window / 2).min(n);
    let mut buf: Vec<f64> = Vec::with_capacity((2 * half + 1).min(n));

    let smoothed = (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            buf.clear();
            buf.extend_from_slice(&values[lo..hi]);
            buf.sort_by(|a, b| a.total_cmp(b));
            let m = buf.len();
            if m % 2 == 1 {
                buf[m / 2]
            } else {
                0.5 * (buf[m / 2 - 1] + buf[m / 2])
            }
        })
        .collect();

    Cow::Owned(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_one_is_identity() {
        let v = [3.0, 1.0, 2.0];
        assert!(matches!(median_filter(&v, 1), Cow::Borrowed(_)));
    }

    #[test]
    fn test_removes_single_spike() {
        let v = [5.0, 5.0, 5.0, 0.0, 5.0, 5.0, 5.0];
        let s = median_filter(&v, 3);
        assert_eq!(&*s, &[5.0; 7]);
    }

    #[test]
    fn test_even_window_rounds_up() {
        let v = [1.0, 9.0, 2.0, 8.0, 3.0];
        assert_eq!(median_filter(&v, 2), median_filter(&v, 3));
    }

    #[test]
    fn test_oversized_window_uses_whole_profile() {
        let v = [3.0, 1.0, 2.0, 5.0];
        let s = median_filter(&v, usize::MAX);
        assert_eq!(&*s, &[2.5; 4]);
        assert_eq!(median_filter(&v, 1001), median_filter(&v, usize::MAX));
    }

    #[test]
    fn test_truncated_edges() {
        let v = [1.0, 4.0, 2.0, 10.0];
        let s = median_filter(&v, 3);
        // 边缘窗口只有两个点，取均值
        assert_eq!(s[0], 2.5);
        assert_eq!(s[1], 2.0);
        assert_eq!(s[3], 6.0);
    }
}
