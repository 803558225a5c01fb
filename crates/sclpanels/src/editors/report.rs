use super::{ControlBlockForm, ControlKind};
use crate::cfg::EditorCfg;
use crate::controlblock::{create_report_control, update_control_block, update_max_clients};
use crate::edit::{Edit, Insert};
use crate::foundation::{
    CheckboxInput, FieldGroup, GroupTarget, Nullable, Pattern, TextInput, Validity, Value,
};
use crate::scl::{ElemId, SclDoc};

pub struct ReportControl;

impl ControlKind for ReportControl {
    const TAG: &'static str = "ReportControl";
    type Form = ReportControlForm;

    fn create(doc: &SclDoc, ied: ElemId, cfg: &EditorCfg) -> Option<Insert> {
        create_report_control(doc, ied, cfg)
    }
}

const TRG_OPS: &[(&str, &str)] = &[
    ("dchg", "Trigger Report through data change"),
    ("qchg", "Trigger Report through data quality change"),
    ("dupd", "Trigger Report through data update"),
    ("period", "Periodically send Report"),
    ("gi", "Allow trigger Report manually"),
];

const OPT_FIELDS: &[(&str, &str)] = &[
    ("seqNum", "Whether Report includes Sequence Number"),
    ("timeStamp", "Whether Report includes Time Stamp"),
    ("dataSet", "Whether Report includes DataSet reference"),
    ("reasonCode", "Whether Report includes reason for trigger"),
    ("dataRef", "Whether Report includes structure of DataSet"),
    ("entryID", "Whether Report includes ID for Report"),
    ("configRef", "Whether Report includes Configuration Revision"),
    ("bufOvfl", "Whether Report includes indicator for buffer overflow"),
];

fn checkbox_group(target: GroupTarget, fields: &[(&'static str, &'static str)]) -> FieldGroup {
    fields.iter().fold(FieldGroup::new(target), |group, &(label, helper)| {
        group.with(label, helper, Nullable::new(CheckboxInput::new(), "false").nullable())
    })
}

/// ReportControl attributes, `RptEnabled max` and the `TrgOps`/`OptFields`
/// groups. Each group is saved on its own.
pub struct ReportControlForm {
    attributes: FieldGroup,
    max_clients: Nullable<TextInput>,
    trg_ops: FieldGroup,
    opt_fields: FieldGroup,
}

impl ReportControlForm {
    pub fn attributes_mut(&mut self) -> &mut FieldGroup {
        &mut self.attributes
    }

    pub fn attributes(&self) -> &FieldGroup {
        &self.attributes
    }

    pub fn trg_ops(&self) -> &FieldGroup {
        &self.trg_ops
    }

    pub fn trg_ops_mut(&mut self) -> &mut FieldGroup {
        &mut self.trg_ops
    }

    pub fn opt_fields(&self) -> &FieldGroup {
        &self.opt_fields
    }

    pub fn opt_fields_mut(&mut self) -> &mut FieldGroup {
        &mut self.opt_fields
    }

    pub fn max_clients(&self) -> Value<String> {
        self.max_clients.maybe_value()
    }

    pub fn set_max_clients(&mut self, max: Value<String>) {
        self.max_clients.set_maybe_value(max);
    }

    /// Number check plus: the new maximum must cover the registered
    /// `ClientLN`s (an absent maximum counts as 0).
    pub fn max_clients_validity(&self, doc: &SclDoc, rcb: ElemId) -> Validity {
        let validity = self.max_clients.check_validity();
        if !validity.is_valid() {
            return validity;
        }
        let Some(rpt_enabled) = doc.first_child(rcb, "RptEnabled") else {
            return Validity::Valid;
        };
        let client_lns = doc.children_by_tag(rpt_enabled, "ClientLN").count();
        let max = self
            .max_clients
            .maybe_value()
            .as_deref()
            .and_then(|m| m.parse::<i64>().ok())
            .map_or(0, |m| m.max(0) as usize);
        if client_lns <= max {
            Validity::Valid
        } else {
            Validity::Invalid(format!("There are {} clientLNs", client_lns))
        }
    }

    fn max_clients_diff(&self, doc: &SclDoc, rcb: ElemId) -> bool {
        let current = doc
            .first_child(rcb, "RptEnabled")
            .and_then(|r| doc.attr(r, "max"));
        self.max_clients.maybe_value().as_deref() != current
    }

    pub fn trg_ops_diff(&self, doc: &SclDoc, rcb: ElemId) -> bool {
        self.trg_ops.some_diff(doc, rcb)
    }

    pub fn opt_fields_diff(&self, doc: &SclDoc, rcb: ElemId) -> bool {
        self.opt_fields.some_diff(doc, rcb)
    }

    pub fn save_trg_ops(&self, doc: &SclDoc, rcb: ElemId) -> Option<Edit> {
        self.trg_ops.save(doc, rcb)
    }

    pub fn save_opt_fields(&self, doc: &SclDoc, rcb: ElemId) -> Option<Edit> {
        self.opt_fields.save(doc, rcb)
    }
}

impl ControlBlockForm for ReportControlForm {
    fn new(cfg: &EditorCfg) -> Self {
        let attributes = FieldGroup::new(GroupTarget::Element)
            .with(
                "name",
                "ReportControl Name",
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
                "ReportControl Description",
                Nullable::new(TextInput::new(), "").nullable(),
            )
            .with(
                "buffered",
                "Whether ReportControl is Buffered",
                Nullable::new(CheckboxInput::new(), "false"),
            )
            .with(
                "rptID",
                "ReportControl ID",
                Nullable::new(TextInput::new(), "").nullable(),
            )
            .with(
                "indexed",
                "Allow multiple Instances of this ReportControl",
                Nullable::new(CheckboxInput::new(), "true").nullable(),
            )
            .with(
                "bufTime",
                "Minimum time between two ReportControl",
                Nullable::new(TextInput::new().required().number(Some(0)), &cfg.default_buf_time).nullable(),
            )
            .with(
                "intgPd",
                "Integrity Period",
                Nullable::new(TextInput::new().required().number(Some(0)), &cfg.default_intg_pd).nullable(),
            );
        ReportControlForm {
            attributes,
            max_clients: Nullable::new(TextInput::new().number(Some(0)), &cfg.default_max_clients).nullable(),
            trg_ops: checkbox_group(GroupTarget::Child("TrgOps"), TRG_OPS),
            opt_fields: checkbox_group(GroupTarget::Child("OptFields"), OPT_FIELDS),
        }
    }

    fn load(&mut self, doc: &SclDoc, cb: ElemId) {
        self.attributes.load(doc, cb);
        let max = doc
            .first_child(cb, "RptEnabled")
            .and_then(|r| doc.attr(r, "max"))
            .map(|m| m.to_string());
        self.max_clients.set_maybe_value(max.into());
        self.trg_ops.load(doc, cb);
        self.opt_fields.load(doc, cb);
    }

    fn some_diff(&self, doc: &SclDoc, cb: ElemId) -> bool {
        self.attributes.some_diff(doc, cb) || self.max_clients_diff(doc, cb)
    }

    fn can_save(&self, doc: &SclDoc, cb: ElemId) -> bool {
        self.attributes.all_valid()
            && self.max_clients_validity(doc, cb).is_valid()
            && self.some_diff(doc, cb)
    }

    fn save(&self, doc: &SclDoc, cb: ElemId) -> Option<Edit> {
        if !self.can_save(doc, cb) {
            return None;
        }
        let mut actions = update_control_block(doc, cb, self.attributes.attribute_diff(doc, cb));
        let max = self.max_clients.maybe_value();
        actions.extend(update_max_clients(doc, cb, max.as_deref()));
        Edit::from_actions(actions)
    }
}
