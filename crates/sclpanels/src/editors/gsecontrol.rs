use super::{ControlBlockForm, ControlKind};
use crate::cfg::EditorCfg;
use crate::controlblock::{create_gse_control, update_control_block};
use crate::edit::{Edit, Insert};
use crate::foundation::{CheckboxInput, FieldGroup, GroupTarget, Nullable, Pattern, SelectInput, TextInput};
use crate::scl::{ElemId, SclDoc};

pub struct GseControl;

impl ControlKind for GseControl {
    const TAG: &'static str = "GSEControl";
    type Form = GseControlForm;

    fn create(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert> {
        create_gse_control(doc, ied, cfg)
    }
}

pub struct GseControlForm {
    attributes: FieldGroup,
}

impl GseControlForm {
    pub fn attributes(&self) -> &FieldGroup {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut FieldGroup {
        &mut self.attributes
    }
}

impl ControlBlockForm for GseControlForm {
    fn new(cfg: &EditorCfg) -> Self {
        let attributes = FieldGroup::new(GroupTarget::Element)
            .with(
                "name",
                "GSEControl Name",
                Nullable::new(
                    TextInput::new()
                        .required()
                        .pattern(Pattern::AsciName)
                        .max_length(cfg.cb_name_max_len),
                    "",
                ),
            )
            .with(
                "desc",
                "GSEControl Description",
                Nullable::new(TextInput::new(), "").nullable(),
            )
            .with(
                "type",
                "Type of the GSEControl",
                Nullable::new(SelectInput::new(&["GOOSE", "GSSE"]), "GOOSE").nullable(),
            )
            .with(
                "appID",
                "GSEControl ID",
                Nullable::new(TextInput::new().required().pattern(Pattern::NormalizedString), ""),
            )
            .with(
                "fixedOffs",
                "Whether GOOSE uses fixed offset encoding",
                Nullable::new(CheckboxInput::new(), "false").nullable(),
            )
            .with(
                "securityEnable",
                "GSEControl Security Settings",
                Nullable::new(
                    SelectInput::new(&["None", "Signature", "SignatureAndEncryption"]),
                    "None",
                )
                .nullable(),
            );
        GseControlForm { attributes }
    }

    fn load(&mut self, doc: &SclDoc, cb: ElemId) {
        self.attributes.load(doc, cb);
    }

    fn some_diff(&self, doc: &SclDoc, cb: ElemId) -> bool {
        self.attributes.some_diff(doc, cb)
    }

    fn can_save(&self, doc: &SclDoc, cb: ElemId) -> bool {
        self.attributes.all_valid() && self.some_diff(doc, cb)
    }

    fn save(&self, doc: &SclDoc, cb: ElemId) -> Option<Edit> {
        if !self.can_save(doc, cb) {
            return None;
        }
        Edit::from_actions(update_control_block(doc, cb, self.attributes.attribute_diff(doc, cb)))
    }
}
