#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod temp_files {
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A temporary directory holding the input files of one test.
    pub struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        pub fn new() -> Self {
            Workspace {
                dir: tempfile::Builder::new()
                    .prefix("annospec_test_")
                    .tempdir()
                    .unwrap(),
            }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Writes `content` to `name` inside the workspace.
        pub fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, content).unwrap();
            path
        }
    }
}

pub mod fixtures {
    use annospec::{parse_annotations, AnnotationElement};

    pub const CONTRACTS: &str = r#"
types:
  - name: Contracts.SampleObject
    members:
      - { name: samplePropertyString1, type: System.String }
      - { name: samplePropertyInt, type: System.Int32, required: true }
      - { name: samplePropertyEnum, type: Contracts.SampleEnum }
      - { name: tags, type: "System.Collections.Generic.List{System.String}" }
  - name: Contracts.SampleObjectV2
    members:
      - { name: name, type: System.String }
      - { name: parent, type: Contracts.SampleObject, nullable: true }
  - name: Contracts.SampleEnum
    kind: enum
    values: [First, Second]
  - name: Contracts.Error
    members:
      - { name: message, type: System.String }
"#;

    /// Four operations over three paths, one of which cannot be resolved.
    pub const ANNOTATIONS: &str = r#"
tag: doc
children:
  - tag: assembly
    children: [{ tag: name, children: ["Sample.Api"] }]
  - tag: members
    children:
      - tag: member
        attributes: { name: "M:Sample.Api.SampleController.GetSample" }
        children:
          - { tag: url, children: ["http://localhost:9000/V1/samples/{id}?queryBool={queryBool}"] }
          - { tag: verb, children: ["GET"] }
          - { tag: summary, children: ["Sample get"] }
          - { tag: group, children: ["Samples"] }
          - { tag: param, attributes: { name: id, in: path, cref: "T:System.String" }, children: ["The sample id"] }
          - { tag: param, attributes: { name: queryBool, required: "true", cref: "T:System.Boolean" }, children: ["Sample flag"] }
          - tag: response
            attributes: { code: "200" }
            children:
              - { tag: see, attributes: { cref: "T:Contracts.SampleObject" } }
              - "Sample object retrieved"
      - tag: member
        attributes: { name: "M:Sample.Api.SampleController.CreateSample" }
        children:
          - { tag: url, children: ["http://localhost:9000/V1/samples"] }
          - { tag: verb, children: ["POST"] }
          - { tag: summary, children: ["Sample post"] }
          - tag: param
            attributes: { name: sample, in: body }
            children:
              - { tag: see, attributes: { cref: "T:Contracts.SampleObject" } }
              - "Sample object"
          - tag: param
            attributes: { name: sampleV2, in: body }
            children:
              - { tag: see, attributes: { cref: "T:Contracts.SampleObjectV2" } }
              - "Sample object v2"
          - { tag: response, attributes: { code: "201", cref: "T:Contracts.SampleObject" }, children: ["Created"] }
      - tag: member
        attributes: { name: "M:Sample.Api.SampleController.Broken" }
        children:
          - { tag: url, children: ["http://localhost:9000/V1/broken"] }
          - { tag: verb, children: ["PUT"] }
          - { tag: param, attributes: { name: thing, in: body, cref: "T:Contracts.DoesNotExist" }, children: ["Nothing"] }
      - tag: member
        attributes: { name: "M:Sample.Api.SampleControllerV2.CreateSample" }
        children:
          - { tag: url, children: ["http://localhost:9000/V1/samples"] }
          - { tag: verb, children: ["POST"] }
          - { tag: summary, children: ["A later summary"] }
          - { tag: response, attributes: { code: "400", cref: "T:Contracts.Error" }, children: ["Bad request"] }
      - tag: member
        attributes: { name: "T:Contracts.SampleObject" }
        children: [{ tag: summary, children: ["A sample object"] }]
      - tag: member
        attributes: { name: "P:Contracts.SampleObject.SamplePropertyString1" }
        children: [{ tag: summary, children: ["A string property"] }]
"#;

    pub const CONFIG: &str = r#"
tag: configuration
children:
  - tag: document
    children:
      - { tag: info, attributes: { title: Configured Sample API, version: "2.1" } }
  - tag: operations
    children:
      - { tag: param, attributes: { name: X-Trace-Id, in: header }, children: ["Trace id"] }
      - { tag: response, attributes: { code: "500", cref: "T:Contracts.Error" }, children: ["Server error"] }
"#;

    pub fn annotations() -> AnnotationElement {
        parse_annotations(ANNOTATIONS, true).unwrap()
    }

    /// A single `GET /V1/shape` operation returning `Contracts.Shape`.
    pub fn shape_annotations() -> AnnotationElement {
        parse_annotations(
            r#"
tag: doc
children:
  - tag: member
    attributes: { name: "M:Api.ShapeController.Get" }
    children:
      - { tag: url, children: ["/V1/shape"] }
      - { tag: verb, children: ["GET"] }
      - { tag: response, attributes: { code: "200", cref: "T:Contracts.Shape" }, children: ["The shape"] }
"#,
            true,
        )
        .unwrap()
    }

    /// A contract defining `Contracts.Shape` with a single member named `member`.
    pub fn shape_contract(member: &str) -> String {
        format!(
            r#"
types:
  - name: Contracts.Shape
    members:
      - {{ name: {member}, type: System.String }}
"#
        )
    }
}
