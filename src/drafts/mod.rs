mod note;

pub use note::NoteDraft;
