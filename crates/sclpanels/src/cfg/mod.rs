use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

// 编辑器相关的配置  新建元素的命名 以及表单的默认值

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EditorCfg {
    /*新建 DataSet 的名称前缀     */
    #[serde(default = "default_new_dataset_prefix")]
    pub new_dataset_prefix: String,
    #[serde(default = "default_new_gse_control_prefix")]
    pub new_gse_control_prefix: String,
    #[serde(default = "default_new_report_control_prefix")]
    pub new_report_control_prefix: String,
    #[serde(default = "default_new_smv_control_prefix")]
    pub new_smv_control_prefix: String,
    /*控制块 和 DataSet 名称最大长度  默认 32 */
    #[serde(default = "default_cb_name_max_len")]
    pub cb_name_max_len: usize,
    /*新建 ReportControl 的 RptEnabled max     */
    #[serde(default = "default_max_clients")]
    pub default_max_clients: String,
    #[serde(default = "default_buf_time")]
    pub default_buf_time: String,
    #[serde(default = "default_intg_pd")]
    pub default_intg_pd: String,
}
fn default_new_dataset_prefix() -> String {
    String::from("newDataSet")
}
fn default_new_gse_control_prefix() -> String {
    String::from("newGSE")
}
fn default_new_report_control_prefix() -> String {
    String::from("newReportControl")
}
fn default_new_smv_control_prefix() -> String {
    String::from("newSampledValueControl")
}
fn default_cb_name_max_len() -> usize {
    32
}
fn default_max_clients() -> String {
    String::from("5")
}
fn default_buf_time() -> String {
    String::from("100")
}
fn default_intg_pd() -> String {
    String::from("1000")
}

impl Default for EditorCfg {
    fn default() -> Self {
        EditorCfg {
            new_dataset_prefix: default_new_dataset_prefix(),
            new_gse_control_prefix: default_new_gse_control_prefix(),
            new_report_control_prefix: default_new_report_control_prefix(),
            new_smv_control_prefix: default_new_smv_control_prefix(),
            cb_name_max_len: default_cb_name_max_len(),
            default_max_clients: default_max_clients(),
            default_buf_time: default_buf_time(),
            default_intg_pd: default_intg_pd(),
        }
    }
}

impl EditorCfg {
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let res: EditorCfg = serde_json::from_str(content).context("parse editor cfg errr")?;
        Ok(res)
    }

    pub async fn read_cfg_file(cfg_file_name: impl AsRef<Path>) -> crate::Result<Self> {
        let content = fs::read_to_string(cfg_file_name)
            .await
            .context("open editor cfg file failed")?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = EditorCfg::from_json(r#"{ "new_dataset_prefix": "ds" }"#).unwrap();
        assert_eq!(cfg.new_dataset_prefix, "ds");
        assert_eq!(cfg.cb_name_max_len, 32);
        assert_eq!(cfg.default_max_clients, "5");
        assert_eq!(EditorCfg::from_json("{}").unwrap(), EditorCfg::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EditorCfg::from_json("{ new_dataset_prefix").is_err());
    }

    #[tokio::test]
    async fn reads_cfg_file() {
        let path = std::env::temp_dir().join("sclpanels_editor_cfg_test.json");
        tokio::fs::write(&path, r#"{ "cb_name_max_len": 64 }"#)
            .await
            .unwrap();
        let cfg = EditorCfg::read_cfg_file(&path).await.unwrap();
        assert_eq!(cfg.cb_name_max_len, 64);
        assert_eq!(cfg.new_gse_control_prefix, "newGSE");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_cfg_file_is_an_error() {
        let res = EditorCfg::read_cfg_file("/nonexistent/sclpanels/editor.json").await;
        assert!(res.is_err());
    }
}
