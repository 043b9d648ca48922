//! Kernel image
//!
//! A compact class library covering the kernel hierarchy (objects, booleans,
//! numbers, points, collections, classes and compiled methods) with representative
//! methods, so served sessions have something real to browse.

use super::{ClassSpec, ImageBuilder, ImageError, MethodSpec, ObjectMemory};
use crate::runtime::{Oop, Runtime};

/// Dialect name reported by the kernel image
pub const KERNEL_DIALECT: &str = "WebsideKernel";

/// Build the kernel image
pub fn kernel_image() -> Result<ObjectMemory, ImageError> {
    let mut image = ImageBuilder::new(KERNEL_DIALECT);
    define_classes(&mut image);
    define_object_methods(&mut image);
    define_magnitude_methods(&mut image);
    define_collection_methods(&mut image);
    define_behavior_methods(&mut image);
    image.build()
}

/// Allocate the objects pinned by a freshly started server
///
/// Answers `(id, object)` pairs: nil, true, `123`, `#(1 2 3)`, `1@2` and the
/// `Point` class.
pub fn sample_objects(memory: &mut ObjectMemory) -> Result<Vec<(String, Oop)>, ImageError> {
    let integer = memory.new_integer(123);
    let elements = vec![
        memory.new_integer(1),
        memory.new_integer(2),
        memory.new_integer(3),
    ];
    let array = memory.new_array(elements);
    let x = memory.new_integer(1);
    let y = memory.new_integer(2);
    let point = memory.new_instance("Point", vec![x, y], Vec::new())?;
    let point_class = memory
        .global("Point")
        .ok_or_else(|| ImageError::UnknownClass("Point".to_string()))?;

    Ok(vec![
        ("0".to_string(), memory.nil()),
        ("1".to_string(), memory.true_object()),
        ("2".to_string(), integer),
        ("3".to_string(), array),
        ("4".to_string(), point),
        ("5".to_string(), point_class),
    ])
}

fn define_classes(image: &mut ImageBuilder) {
    image
        .define_class(
            ClassSpec::new("Object")
                .class_variables(&["DependentsFields"])
                .package("Kernel-Objects"),
        )
        .define_class(
            ClassSpec::new("UndefinedObject")
                .superclass("Object")
                .package("Kernel-Objects"),
        )
        .define_class(ClassSpec::new("Boolean").superclass("Object").package("Kernel-Objects"))
        .define_class(ClassSpec::new("True").superclass("Boolean").package("Kernel-Objects"))
        .define_class(ClassSpec::new("False").superclass("Boolean").package("Kernel-Objects"))
        .define_class(ClassSpec::new("Magnitude").superclass("Object").package("Kernel-Numbers"))
        .define_class(ClassSpec::new("Number").superclass("Magnitude").package("Kernel-Numbers"))
        .define_class(ClassSpec::new("Integer").superclass("Number").package("Kernel-Numbers"))
        .define_class(
            ClassSpec::new("SmallInteger")
                .superclass("Integer")
                .package("Kernel-Numbers"),
        )
        .define_class(
            ClassSpec::new("Point")
                .superclass("Object")
                .instance_variables(&["x", "y"])
                .package("Kernel-BasicObjects"),
        )
        .define_class(
            ClassSpec::new("Collection")
                .superclass("Object")
                .package("Collections-Abstract"),
        )
        .define_class(
            ClassSpec::new("SequenceableCollection")
                .superclass("Collection")
                .package("Collections-Abstract"),
        )
        .define_class(
            ClassSpec::new("ArrayedCollection")
                .superclass("SequenceableCollection")
                .package("Collections-Abstract"),
        )
        .define_class(
            ClassSpec::new("Array")
                .superclass("ArrayedCollection")
                .package("Collections-Sequenceable")
                .arrayed(),
        )
        .define_class(
            ClassSpec::new("String")
                .superclass("ArrayedCollection")
                .package("Collections-Strings"),
        )
        .define_class(
            ClassSpec::new("Symbol")
                .superclass("String")
                .package("Collections-Strings"),
        )
        .define_class(
            ClassSpec::new("Behavior")
                .superclass("Object")
                .instance_variables(&["superclass", "methodDictionary", "format"])
                .package("Kernel-Classes"),
        )
        .define_class(
            ClassSpec::new("ClassDescription")
                .superclass("Behavior")
                .instance_variables(&["instanceVariables", "organization"])
                .package("Kernel-Classes"),
        )
        .define_class(
            ClassSpec::new("Class")
                .superclass("ClassDescription")
                .instance_variables(&["subclasses", "name", "classPool", "category"])
                .package("Kernel-Classes"),
        )
        .define_class(
            ClassSpec::new("Metaclass")
                .superclass("ClassDescription")
                .instance_variables(&["thisClass"])
                .package("Kernel-Classes"),
        )
        .define_class(
            ClassSpec::new("CompiledMethod")
                .superclass("Object")
                .instance_variables(&["selector", "methodClass", "source"])
                .package("Kernel-Methods"),
        );
}

fn define_object_methods(image: &mut ImageBuilder) {
    image
        .define_method(
            "Object",
            MethodSpec::new("=")
                .category("comparing")
                .source("= anObject\n\t^self == anObject")
                .sends(&["=="]),
        )
        .define_method(
            "Object",
            MethodSpec::new("hash")
                .category("comparing")
                .source("hash\n\t^self identityHash")
                .sends(&["identityHash"]),
        )
        .define_method(
            "Object",
            MethodSpec::new("printString")
                .category("printing")
                .source("printString\n\t| stream |\n\tstream := String new writeStream.\n\tself printOn: stream.\n\t^stream contents")
                .sends(&["new", "writeStream", "printOn:", "contents"])
                .globals(&["String"]),
        )
        .define_method(
            "Object",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\t| title |\n\ttitle := self class name.\n\taStream nextPutAll: title article; space; nextPutAll: title")
                .sends(&["class", "name", "nextPutAll:", "article", "space"]),
        )
        .define_method(
            "Object",
            MethodSpec::new("yourself")
                .category("accessing")
                .source("yourself\n\t^self"),
        )
        .define_method(
            "Object",
            MethodSpec::new("isNil")
                .category("testing")
                .source("isNil\n\t^false"),
        )
        .define_method(
            "Object",
            MethodSpec::new("dependents")
                .category("dependents")
                .source("dependents\n\t^DependentsFields at: self ifAbsent: [#()]")
                .class_variables(&["DependentsFields"])
                .sends(&["at:ifAbsent:"]),
        )
        .define_method(
            "Object",
            MethodSpec::new("error:")
                .category("error handling")
                .source("error: aString\n\t^Error signal: aString")
                .sends(&["signal:"])
                .globals(&["Error"]),
        )
        .define_method(
            "Object class",
            MethodSpec::new("new")
                .category("instance creation")
                .source("new\n\t^self basicNew initialize")
                .sends(&["basicNew", "initialize"]),
        )
        .define_method(
            "UndefinedObject",
            MethodSpec::new("isNil")
                .category("testing")
                .source("isNil\n\t^true"),
        )
        .define_method(
            "UndefinedObject",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\taStream nextPutAll: 'nil'")
                .sends(&["nextPutAll:"]),
        )
        .define_method(
            "Boolean",
            MethodSpec::new("not")
                .category("logical operations")
                .source("not\n\t^self subclassResponsibility")
                .sends(&["subclassResponsibility"]),
        )
        .define_method(
            "True",
            MethodSpec::new("not")
                .category("logical operations")
                .source("not\n\t^false"),
        )
        .define_method(
            "True",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\taStream nextPutAll: 'true'")
                .sends(&["nextPutAll:"]),
        )
        .define_method(
            "False",
            MethodSpec::new("not")
                .category("logical operations")
                .source("not\n\t^true"),
        )
        .define_method(
            "False",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\taStream nextPutAll: 'false'")
                .sends(&["nextPutAll:"]),
        );
}

fn define_magnitude_methods(image: &mut ImageBuilder) {
    image
        .define_method(
            "Magnitude",
            MethodSpec::new("<")
                .category("comparing")
                .source("< aMagnitude\n\t^self subclassResponsibility")
                .sends(&["subclassResponsibility"]),
        )
        .define_method(
            "Magnitude",
            MethodSpec::new("max:")
                .category("comparing")
                .source("max: aMagnitude\n\t^self < aMagnitude ifTrue: [aMagnitude] ifFalse: [self]")
                .sends(&["<", "ifTrue:ifFalse:"]),
        )
        .define_method(
            "Number",
            MethodSpec::new("@")
                .category("converting")
                .source("@ y\n\t^Point x: self y: y")
                .sends(&["x:y:"])
                .globals(&["Point"]),
        )
        .define_method(
            "Number",
            MethodSpec::new("isZero")
                .category("testing")
                .source("isZero\n\t^self = 0")
                .sends(&["="]),
        )
        .define_method(
            "Integer",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\taStream nextPutAll: (self printString: 10)")
                .sends(&["nextPutAll:", "printString:"]),
        )
        .define_method(
            "SmallInteger",
            MethodSpec::new("+").category("arithmetic"),
        )
        .define_method(
            "SmallInteger",
            MethodSpec::new("*").category("arithmetic"),
        )
        .define_method(
            "SmallInteger",
            MethodSpec::new("=").category("comparing"),
        )
        .define_method(
            "Point",
            MethodSpec::new("x")
                .category("accessing")
                .source("x\n\t^x")
                .reads(&["x"]),
        )
        .define_method(
            "Point",
            MethodSpec::new("y")
                .category("accessing")
                .source("y\n\t^y")
                .reads(&["y"]),
        )
        .define_method(
            "Point",
            MethodSpec::new("setX:setY:")
                .category("private")
                .source("setX: xValue setY: yValue\n\tx := xValue.\n\ty := yValue")
                .writes(&["x", "y"]),
        )
        .define_method(
            "Point",
            MethodSpec::new("+")
                .category("arithmetic")
                .source("+ arg\n\t^(x + arg x) @ (y + arg y)")
                .reads(&["x", "y"])
                .sends(&["+", "x", "y", "@"]),
        )
        .define_method(
            "Point",
            MethodSpec::new("=")
                .category("comparing")
                .source("= aPoint\n\t^(aPoint isKindOf: Point) and: [x = aPoint x and: [y = aPoint y]]")
                .reads(&["x", "y"])
                .sends(&["isKindOf:", "and:", "=", "x", "y"])
                .globals(&["Point"]),
        )
        .define_method(
            "Point",
            MethodSpec::new("hash")
                .category("comparing")
                .source("hash\n\t^x hash bitXor: y hash")
                .reads(&["x", "y"])
                .sends(&["hash", "bitXor:"]),
        )
        .define_method(
            "Point",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\tx printOn: aStream.\n\taStream nextPut: $@.\n\ty printOn: aStream")
                .reads(&["x", "y"])
                .sends(&["printOn:", "nextPut:"]),
        )
        .define_method(
            "Point class",
            MethodSpec::new("x:y:")
                .category("instance creation")
                .source("x: xValue y: yValue\n\t^self basicNew setX: xValue setY: yValue")
                .sends(&["basicNew", "setX:setY:"]),
        );
}

fn define_collection_methods(image: &mut ImageBuilder) {
    image
        .define_method(
            "Collection",
            MethodSpec::new("do:")
                .category("enumerating")
                .source("do: aBlock\n\tself subclassResponsibility")
                .sends(&["subclassResponsibility"]),
        )
        .define_method(
            "Collection",
            MethodSpec::new("isEmpty")
                .category("testing")
                .source("isEmpty\n\t^self size = 0")
                .sends(&["size", "="]),
        )
        .define_method(
            "Collection",
            MethodSpec::new("size")
                .category("accessing")
                .source("size\n\t| tally |\n\ttally := 0.\n\tself do: [:each | tally := tally + 1].\n\t^tally")
                .sends(&["do:", "+"]),
        )
        .define_method(
            "SequenceableCollection",
            MethodSpec::new("do:")
                .category("enumerating")
                .source("do: aBlock\n\t1 to: self size do: [:index | aBlock value: (self at: index)]")
                .sends(&["to:do:", "size", "value:", "at:"]),
        )
        .define_method(
            "SequenceableCollection",
            MethodSpec::new("first")
                .category("accessing")
                .source("first\n\t^self at: 1")
                .sends(&["at:"]),
        )
        .define_method(
            "Array",
            MethodSpec::new("isArray")
                .category("testing")
                .source("isArray\n\t^true"),
        )
        .define_method(
            "Array",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\taStream nextPutAll: '#('.\n\tself do: [:each | each printOn: aStream] separatedBy: [aStream space].\n\taStream nextPut: $)")
                .sends(&["nextPutAll:", "do:separatedBy:", "printOn:", "space", "nextPut:"]),
        )
        .define_method(
            "String",
            MethodSpec::new(",")
                .category("copying")
                .source(", aString\n\t^self copyReplaceFrom: self size + 1 to: self size with: aString")
                .sends(&["copyReplaceFrom:to:with:", "size", "+"]),
        )
        .define_method(
            "String",
            MethodSpec::new("printOn:")
                .category("printing")
                .source("printOn: aStream\n\taStream nextPut: $'; nextPutAll: self; nextPut: $'")
                .sends(&["nextPut:", "nextPutAll:"]),
        )
        .define_method(
            "Symbol",
            MethodSpec::new("asString")
                .category("converting")
                .source("asString\n\t^String withAll: self")
                .sends(&["withAll:"])
                .globals(&["String"]),
        );
}

fn define_behavior_methods(image: &mut ImageBuilder) {
    image
        .define_method(
            "Behavior",
            MethodSpec::new("superclass")
                .category("accessing")
                .source("superclass\n\t^superclass")
                .reads(&["superclass"]),
        )
        .define_method(
            "Behavior",
            MethodSpec::new("selectors")
                .category("accessing method dictionary")
                .source("selectors\n\t^methodDictionary keys")
                .reads(&["methodDictionary"])
                .sends(&["keys"]),
        )
        .define_method(
            "Behavior",
            MethodSpec::new("basicNew")
                .category("instance creation"),
        )
        .define_method(
            "ClassDescription",
            MethodSpec::new("instanceVariableNames")
                .category("accessing")
                .source("instanceVariableNames\n\t^instanceVariables ifNil: [#()]")
                .reads(&["instanceVariables"])
                .sends(&["ifNil:"]),
        )
        .define_method(
            "Class",
            MethodSpec::new("name")
                .category("accessing")
                .source("name\n\t^name")
                .reads(&["name"]),
        )
        .define_method(
            "Class",
            MethodSpec::new("category")
                .category("accessing")
                .source("category\n\t^category")
                .reads(&["category"]),
        )
        .define_method(
            "Class",
            MethodSpec::new("category:")
                .category("accessing")
                .source("category: aString\n\tcategory := aString")
                .writes(&["category"]),
        )
        .define_method(
            "Class",
            MethodSpec::new("subclasses")
                .category("accessing class hierarchy")
                .source("subclasses\n\t^subclasses ifNil: [#()]")
                .reads(&["subclasses"])
                .sends(&["ifNil:"]),
        )
        .define_method(
            "Metaclass",
            MethodSpec::new("name")
                .category("accessing")
                .source("name\n\t^thisClass name , ' class'")
                .reads(&["thisClass"])
                .sends(&["name", ","]),
        )
        .define_method(
            "CompiledMethod",
            MethodSpec::new("selector")
                .category("accessing")
                .source("selector\n\t^selector")
                .reads(&["selector"]),
        )
        .define_method(
            "CompiledMethod",
            MethodSpec::new("methodClass")
                .category("accessing")
                .source("methodClass\n\t^methodClass")
                .reads(&["methodClass"]),
        )
        .define_method(
            "CompiledMethod",
            MethodSpec::new("sourceCode")
                .category("accessing")
                .source("sourceCode\n\t^source ifNil: ['no source']")
                .reads(&["source"])
                .sends(&["ifNil:"]),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_image_builds() {
        let memory = kernel_image().unwrap();
        assert_eq!(memory.dialect(), KERNEL_DIALECT);
        for name in ["Object", "Point", "Array", "Metaclass", "CompiledMethod"] {
            assert!(memory.global(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_sample_objects() {
        let mut memory = kernel_image().unwrap();
        let samples = sample_objects(&mut memory).unwrap();
        let ids: Vec<&str> = samples.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5"]);
        assert_eq!(memory.print_string(samples[2].1), "123");
        assert_eq!(memory.print_string(samples[3].1), "#(1 2 3)");
        assert_eq!(memory.print_string(samples[4].1), "a Point");
        assert_eq!(memory.print_string(samples[5].1), "Point");
    }

    #[test]
    fn test_primitive_methods_have_no_source() {
        let memory = kernel_image().unwrap();
        let small_integer = memory.global("SmallInteger").unwrap();
        let plus = memory.lookup_selector(small_integer, "+").unwrap();
        assert_eq!(memory.method_source(plus), memory.nil());
    }

    #[test]
    fn test_senders_and_references() {
        let memory = kernel_image().unwrap();
        let point = memory.global("Point").unwrap();
        let senders = memory.senders_of("setX:setY:");
        assert_eq!(senders.len(), 1);
        assert_eq!(
            memory.species_name(memory.method_class(senders[0])),
            "Point class"
        );
        let references = memory.references_to("Point");
        assert!(references
            .iter()
            .any(|&m| memory.method_class(m) == point));
    }
}
