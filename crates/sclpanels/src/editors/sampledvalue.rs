use super::{ControlBlockForm, ControlKind};
use crate::cfg::EditorCfg;
use crate::controlblock::{create_smv_control, update_control_block};
use crate::edit::{Edit, Insert};
use crate::foundation::{CheckboxInput, FieldGroup, GroupTarget, Nullable, Pattern, SelectInput, TextInput};
use crate::scl::{identity, ElemId, SclDoc};

pub struct SampledValueControl;

impl ControlKind for SampledValueControl {
    const TAG: &'static str = "SampledValueControl";
    type Form = SampledValueControlForm;

    /// Only blocks of `AccessPoint > Server > LDevice > LN0`.
    fn control_blocks(doc: &SclDoc, ied: ElemId) -> Vec<ElemId> {
        let step = |parents: Vec<ElemId>, tag: &'static str| -> Vec<ElemId> {
            parents
                .into_iter()
                .flat_map(|p| doc.children_by_tag(p, tag).collect::<Vec<_>>())
                .collect()
        };
        ["AccessPoint", "Server", "LDevice", "LN0", Self::TAG]
            .into_iter()
            .fold(vec![ied], step)
    }

    /// Identity of the owning LN0.
    fn supporting_text(doc: &SclDoc, cb: ElemId) -> String {
        let id = identity(doc, cb);
        match id.rsplit_once('>') {
            Some((path, _)) => path.to_string(),
            None => String::new(),
        }
    }

    fn create(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert> {
        create_smv_control(doc, ied, cfg)
    }
}

const SMV_OPTS: &[(&str, &str)] = &[
    ("refreshTime", "Whether refresh time is included"),
    ("sampleSynchronized", "Whether sample synchronization is included"),
    ("sampleRate", "Whether sample rate is included"),
    ("dataSet", "Whether DataSet reference is included"),
    ("security", "Whether security information is included"),
];

pub struct SampledValueControlForm {
    attributes: FieldGroup,
    smv_opts: FieldGroup,
}

impl SampledValueControlForm {
    pub fn attributes(&self) -> &FieldGroup {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut FieldGroup {
        &mut self.attributes
    }

    pub fn smv_opts(&self) -> &FieldGroup {
        &self.smv_opts
    }

    pub fn smv_opts_mut(&mut self) -> &mut FieldGroup {
        &mut self.smv_opts
    }

    pub fn smv_opts_diff(&self, doc: &SclDoc, cb: ElemId) -> bool {
        self.smv_opts.some_diff(doc, cb)
    }

    pub fn save_smv_opts(&self, doc: &SclDoc, cb: ElemId) -> Option<Edit> {
        self.smv_opts.save(doc, cb)
    }
}

impl ControlBlockForm for SampledValueControlForm {
    fn new(cfg: &EditorCfg) -> Self {
        let attributes = FieldGroup::new(GroupTarget::Element)
            .with(
                "name",
                "SampledValueControl Name",
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
                "SampledValueControl Description",
                Nullable::new(TextInput::new(), "").nullable(),
            )
            .with(
                "multicast",
                "Whether SampledValueControl is multicast",
                Nullable::new(CheckboxInput::new(), "true").nullable(),
            )
            .with(
                "smvID",
                "SampledValueControl ID",
                Nullable::new(TextInput::new().required(), ""),
            )
            .with(
                "smpMod",
                "Sample mode (Samples per Period, Samples per Second, Seconds per Sample)",
                Nullable::new(SelectInput::new(&["SmpPerPeriod", "SmpPerSec", "SecPerSmp"]), "SmpPerPeriod")
                    .nullable(),
            )
            .with(
                "smpRate",
                "Sample Rate (Based on Sample Mode)",
                Nullable::new(TextInput::new().required().number(Some(0)), "80"),
            )
            .with(
                "nofASDU",
                "Number of Samples per Ethernet packet",
                Nullable::new(TextInput::new().required().number(Some(0)), "1"),
            )
            .with(
                "securityEnable",
                "SampledValueControl Security Settings",
                Nullable::new(
                    SelectInput::new(&["None", "Signature", "SignatureAndEncryption"]),
                    "None",
                )
                .nullable(),
            );
        let smv_opts = SMV_OPTS
            .iter()
            .fold(FieldGroup::new(GroupTarget::Child("SmvOpts")), |group, &(label, helper)| {
                group.with(label, helper, Nullable::new(CheckboxInput::new(), "false").nullable())
            });
        SampledValueControlForm { attributes, smv_opts }
    }

    fn load(&mut self, doc: &SclDoc, cb: ElemId) {
        self.attributes.load(doc, cb);
        self.smv_opts.load(doc, cb);
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
