use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

// 用来读取启动配置的文件相关

#[derive(Serialize, Deserialize, Debug)]
pub struct StartupCfg {
    pub scl_filename: String,
    /*结果输出文件     */
    #[serde(default = "default_output_filename")]
    pub output_filename: String,
    /*编辑器配置文件 不配置则使用默认值     */
    #[serde(default)]
    pub editor_cfg_filename: Option<String>,
    /*只输出这个 IED 不配置则全部输出     */
    #[serde(default)]
    pub ied_name: Option<String>,
}

fn default_output_filename() -> String {
    "outputinfo.json".to_string()
}

pub async fn read_startup_cfg_file(cfg_file_name: impl AsRef<Path>) -> crate::Result<StartupCfg> {
    let content = fs::read_to_string(cfg_file_name)
        .await
        .context("open startup cfg file failed")?;

    let res: StartupCfg = serde_json::from_str(&content).context("parse startup cfg errr")?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let cfg: StartupCfg = serde_json::from_str(r#"{ "scl_filename": "station.scd" }"#).unwrap();
        assert_eq!(cfg.output_filename, "outputinfo.json");
        assert_eq!(cfg.editor_cfg_filename, None);
        assert_eq!(cfg.ied_name, None);
    }
}
