//! Floorplanning domain: circuits, instances and height bounds

pub mod bounds;
pub mod circuit;
pub mod io;

pub use bounds::HeightRange;
pub use circuit::{Circuit, Instance};
pub use io::{
    create_example_instances, load_instance_from_file, load_instances_from_directory,
    parse_instance_from_string, save_instance_to_file, InstanceError,
};
