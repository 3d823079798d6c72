pub mod account;
pub mod file;
pub mod task;
pub mod task_list;

pub use account::{Account, Credentials, UpdateAccountRequest};
pub use file::{StoredFile, UploadFileRequest};
pub use task::{FileRef, Task, TaskInput, TaskSummary};
pub use task_list::{TaskList, TaskListDetails, TaskListNameRequest};
