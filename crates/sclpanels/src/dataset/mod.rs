//! DataSet side of the editors: picker trees, the FCDA mapper and the
//! DataSet element form.

pub mod editor;
pub mod fcda;
pub mod tree;

pub use editor::{
    attribute_picker, data_object_picker, fcda_items, remove_fcda, save_data_attributes,
    save_data_objects, DataSetForm, FcdaItem,
};
pub use fcda::{add_fcdas, add_fcdos};
pub use tree::{
    build_attribute_tree, build_data_object_tree, resolve_fc_path, resolve_tree_path, FcPath,
    Tree, TreeNode,
};
