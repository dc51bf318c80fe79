//! 启动过程的诊断与指标出口

use std::collections::HashMap;

/// 诊断事件出口
pub trait Diagnostics: Send + Sync {
    /// 发送诊断事件
    fn send_diagnostic(&self, name: &str, message: &str, tags: &HashMap<String, String>);
}

/// 指标出口
pub trait Metrics: Send + Sync {
    /// 发送累加指标
    fn send_sum_metric(&self, name: &str, value: f64, tags: &HashMap<String, String>);

    /// 发送直方图指标
    fn send_histogram_metric(&self, name: &str, value: f64, tags: &HashMap<String, String>);
}
