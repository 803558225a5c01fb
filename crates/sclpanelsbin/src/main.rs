mod cfg;

pub use anyhow::Result;
use sclpanels::cfg::EditorCfg;
use sclpanels::dataset::{build_attribute_tree, build_data_object_tree, Tree};
use sclpanels::editors::{
    ControlBlockEditor, ControlKind, GseControlEditor, ReportControlEditor, SampledValueControlEditor,
    SelectionGroup,
};
use sclpanels::scl::{dom::read_scl_file, identity, SclDoc};
use serde::Serialize;
use std::rc::Rc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/***************************************/
/***********   常量区域      Start ******************/
/***************************************/
//主版本号
const MAIN_VERION: u32 = 0;
//次版本号
const SUB_VERION: u32 = 1;
//修改序号
const CHANGE_INDEX: u32 = 0;
//修改时间
const CHANGE_DATE: u32 = 261016;

/*初始配置文件路径     */
const STARTUP_CFG_FILE_NAME: &str = "startupcfg.json";
/***************************************/
/***********   常量区域      End ******************/
/***************************************/

/// Picker trees of one Server.
#[derive(Serialize)]
struct ServerInfo {
    ied_name: String,
    server: String,
    attribute_tree: Tree,
    data_object_tree: Tree,
}

#[derive(Serialize)]
struct OutputInfo {
    servers: Vec<ServerInfo>,
    gse_controls: Vec<SelectionGroup>,
    report_controls: Vec<SelectionGroup>,
    sampled_value_controls: Vec<SelectionGroup>,
}

fn selection_list<K: ControlKind>(
    mut editor: ControlBlockEditor<K>,
    doc: &Rc<SclDoc>,
    ied_name: Option<&str>,
) -> Vec<SelectionGroup> {
    editor.set_doc(doc.clone());
    editor
        .selection_list()
        .into_iter()
        .filter(|group| ied_name.map_or(true, |name| group.ied_name == name))
        .collect()
}

fn servers(doc: &SclDoc, ied_name: Option<&str>) -> Vec<ServerInfo> {
    doc.children_by_tag(doc.root(), "IED")
        .filter(|ied| ied_name.map_or(true, |name| doc.attr(*ied, "name") == Some(name)))
        .flat_map(|ied| doc.descendants_by_tag(ied, &["Server"]))
        .map(|server| {
            let ied = doc.closest(server, "IED");
            ServerInfo {
                ied_name: ied
                    .and_then(|i| doc.attr(i, "name"))
                    .unwrap_or("")
                    .to_string(),
                server: identity(doc, server),
                attribute_tree: build_attribute_tree(doc, server),
                data_object_tree: build_data_object_tree(doc, server),
            }
        })
        .collect()
}

#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!(
        "Rust SCL Panels ,version :{}.{}.{}_{}",
        MAIN_VERION, SUB_VERION, CHANGE_INDEX, CHANGE_DATE
    );
    println!(
        "RUN START SINCE {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let startup_cfg = cfg::startupcfg::read_startup_cfg_file(STARTUP_CFG_FILE_NAME).await?;
    info!("startup cfg {:?}", startup_cfg);

    let editor_cfg = match &startup_cfg.editor_cfg_filename {
        Some(filename) => EditorCfg::read_cfg_file(filename).await?,
        None => EditorCfg::default(),
    };

    let doc = Rc::new(read_scl_file(&startup_cfg.scl_filename).await?);
    info!("scl file {} loaded, {} elements", startup_cfg.scl_filename, doc.len());

    let ied_name = startup_cfg.ied_name.as_deref();
    let server_infos = servers(&doc, ied_name);
    if server_infos.is_empty() {
        warn!("no Server found for ied {:?}", ied_name);
    }

    let output = OutputInfo {
        servers: server_infos,
        gse_controls: selection_list(GseControlEditor::new(editor_cfg.clone()), &doc, ied_name),
        report_controls: selection_list(ReportControlEditor::new(editor_cfg.clone()), &doc, ied_name),
        sampled_value_controls: selection_list(SampledValueControlEditor::new(editor_cfg), &doc, ied_name),
    };

    tokio::fs::write(
        &startup_cfg.output_filename,
        serde_json::to_string_pretty(&output)?.as_bytes(),
    )
    .await?;
    info!("output written to {}", startup_cfg.output_filename);

    Ok(())
}
