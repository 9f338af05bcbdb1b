//! # 线剖面数据模型
//!
//! 一个 CSV 文件对应一个 `ProfileDataset`，其中每一列（或每一对 x/y 列）是一条
//! 沿 ROI 采样的强度剖面。加载后只读。
//!
//! ## 依赖关系
//! - 被 `parsers/profile_csv.rs` 构造
//! - 被 `analysis/` 和 `commands/` 使用

use serde::Serialize;

/// 单条线剖面
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    /// 列名（CSV 表头）
    pub name: String,

    /// 所属区域标签
    pub region: String,

    /// 物理距离（已乘以标定系数）
    pub distance: Vec<f64>,

    /// 像素强度
    pub intensity: Vec<f64>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        distance: Vec<f64>,
        intensity: Vec<f64>,
    ) -> Self {
        Profile {
            name: name.into(),
            region: region.into(),
            distance,
            intensity,
        }
    }

    /// 采样点数
    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// 平均采样间距（距离单位）
    pub fn mean_spacing(&self) -> f64 {
        mean_spacing(&self.distance)
    }
}

/// 距离轴的平均采样间距；少于两个点时取 1
pub fn mean_spacing(distance: &[f64]) -> f64 {
    match (distance.first(), distance.last()) {
        (Some(first), Some(last)) if distance.len() > 1 => {
            (last - first) / (distance.len() - 1) as f64
        }
        _ => 1.0,
    }
}

/// 一个 CSV 文件中的全部剖面
#[derive(Debug, Clone)]
pub struct ProfileDataset {
    /// 来源文件
    pub source: String,

    /// 文件级区域标签（按列分组时未匹配的列归入此区域）
    pub region: String,

    /// 剖面列表（保持列顺序）
    pub profiles: Vec<Profile>,
}

impl ProfileDataset {
    pub fn new(source: impl Into<String>, region: impl Into<String>) -> Self {
        ProfileDataset {
            source: source.into(),
            region: region.into(),
            profiles: Vec::new(),
        }
    }

    /// 数据集中出现的区域标签（按首次出现顺序）
    pub fn regions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for profile in &self.profiles {
            if !seen.contains(&profile.region.as_str()) {
                seen.push(&profile.region);
            }
        }
        seen
    }
}
