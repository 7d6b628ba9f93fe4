//! Face tracking, stabilization and self-enrollment.
//!
//! Faces are followed across frames by nearest centroid. A face that stays
//! unrecognized long enough is either added as a new sample of the identity
//! it most resembles or enrolled as a new identity, after which the model is
//! retrained.

pub mod catalog {
    pub mod identity_catalog;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod enrollment {
    pub mod domain {
        pub mod enrollment_sink;
    }
    pub mod infrastructure {
        pub mod directory_enrollment_sink;
    }
}

pub mod pipeline {
    pub mod interrupt_signal;
    pub mod restart_policy;
    pub mod supervise_use_case;
    pub mod track_faces_use_case;
    pub mod tracking_logger;
    pub mod train_model_use_case;
    pub mod infrastructure {
        pub mod process_child_runner;
        pub mod stdin_interrupt;
    }
}

pub mod recognition {
    pub mod domain {
        pub mod face_recognizer;
    }
    pub mod infrastructure {
        pub mod lbph_model;
        pub mod lbph_recognizer;
    }
}

pub mod shared {
    pub mod atomic_file;
    pub mod bounding_box;
    pub mod clock;
    pub mod config;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
}

pub mod tracking {
    pub mod domain {
        pub mod decision_engine;
        pub mod stability_policy;
        pub mod track;
        pub mod track_correlator;
    }
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_frame_source;
        pub mod image_file_reader;
        pub mod image_file_writer;
    }
}
